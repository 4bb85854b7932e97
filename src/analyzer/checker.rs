//! Rule evaluation for dependency references

use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::analyzer::rules::{RuleSet, VersionRule};
use crate::analyzer::types::{Issue, IssueType, Severity};
use crate::parser::types::DependencyReference;
use crate::patch::PatchEngine;
use crate::patch::types::SchemaChanges;
use crate::version::resolver::{VersionResolver, split_repository};
use crate::version::semver::{RefKind, is_below_major, major_distance};

pub struct IssueAnalyzer {
    rules: RuleSet,
    resolver: Arc<VersionResolver>,
    patches: Arc<PatchEngine>,
    composite_only: bool,
}

impl IssueAnalyzer {
    pub fn new(rules: RuleSet, resolver: Arc<VersionResolver>, patches: Arc<PatchEngine>) -> Self {
        Self {
            rules,
            resolver,
            patches,
            composite_only: false,
        }
    }

    /// Only evaluate reusable workflows and composite action steps
    pub fn composite_only(mut self, enabled: bool) -> Self {
        self.composite_only = enabled;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Evaluate every reference and return the issues in input order
    ///
    /// Repositories are evaluated concurrently. References to the same
    /// repository run one after another, so the first one warms the tag
    /// index and the rest are answered from it.
    pub async fn analyze_actions(&self, references: &[DependencyReference]) -> Vec<Issue> {
        let mut by_repository: IndexMap<String, Vec<(usize, &DependencyReference)>> =
            IndexMap::new();
        for (position, reference) in references
            .iter()
            .enumerate()
            .filter(|(_, reference)| !self.composite_only || reference.is_composite)
        {
            by_repository
                .entry(reference.repository.to_ascii_lowercase())
                .or_default()
                .push((position, reference));
        }
        let evaluated: usize = by_repository.values().map(Vec::len).sum();

        let groups = by_repository.into_values().map(|group| async move {
            let mut found = Vec::with_capacity(group.len());
            for (position, reference) in group {
                found.push((position, self.analyze_reference(reference).await));
            }
            found
        });

        let mut per_reference: Vec<(usize, Vec<Issue>)> =
            join_all(groups).await.into_iter().flatten().collect();
        per_reference.sort_by_key(|(position, _)| *position);

        let issues: Vec<Issue> = per_reference
            .into_iter()
            .flat_map(|(_, issues)| issues)
            .collect();

        info!(
            "Analyzed {} of {} references, found {} issues",
            evaluated,
            references.len(),
            issues.len()
        );
        issues
    }

    /// Issues for one reference: security, deprecated, outdated, migration
    pub async fn analyze_reference(&self, reference: &DependencyReference) -> Vec<Issue> {
        let Some(rule) = self.rules.get(&reference.repository) else {
            debug!("No rule for {}", reference.repository);
            return vec![];
        };

        let repository = reference.repository.as_str();
        let current = reference.version.as_str();

        let insecure = rule.insecure_versions.contains(current);
        let deprecated = rule.deprecated_versions.contains(current);
        let outdated = self
            .resolver
            .is_version_outdated(repository, current, &rule.latest_version)
            .await;

        let mut issues = Vec::new();

        if insecure || deprecated || outdated {
            let suggested = self
                .suggest_version(repository, current, &rule.latest_version)
                .await;

            if insecure {
                let advisory = rule.advisory.as_deref().unwrap_or("see upstream advisory");
                issues.push(self.issue(
                    reference,
                    rule,
                    IssueType::Security,
                    Severity::High,
                    &suggested,
                    format!("{}@{} has a known vulnerability ({})", repository, current, advisory),
                ));
            }

            if deprecated {
                issues.push(self.issue(
                    reference,
                    rule,
                    IssueType::Deprecated,
                    Severity::High,
                    &suggested,
                    format!("{}@{} is deprecated", repository, current),
                ));
            }

            if outdated {
                let severity = self.severity(repository, current, rule).await;
                let mut issue = self.issue(
                    reference,
                    rule,
                    IssueType::Outdated,
                    severity,
                    &suggested,
                    format!(
                        "{}@{} is outdated (latest: {})",
                        repository, current, rule.latest_version
                    ),
                );
                issue.schema_changes =
                    self.schema_changes(repository, current, repository, &rule.latest_version);
                issues.push(issue);
            }
        }

        if let Some((target_repository, target_version)) = rule.migration_target() {
            let target = format!("{}@{}", target_repository, target_version);
            let mut issue = self.issue(
                reference,
                rule,
                IssueType::Migration,
                Severity::Medium,
                target_version,
                format!("{} has moved to {}", repository, target),
            );
            issue.migration_target = Some(target);
            issue.schema_changes =
                self.schema_changes(repository, current, target_repository, target_version);
            issues.push(issue);
        }

        issues
    }

    /// High when the major version is below the rule's minimum, otherwise by
    /// major distance to the latest version
    async fn severity(&self, repository: &str, current: &str, rule: &VersionRule) -> Severity {
        if let Some(minimum) = &rule.minimum_version
            && self.is_below_minimum(repository, current, minimum).await
        {
            return Severity::High;
        }

        if major_distance(current, &rule.latest_version) >= 2 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    async fn is_below_minimum(&self, repository: &str, current: &str, minimum: &str) -> bool {
        if let Some(below) = is_below_major(current, minimum) {
            return below;
        }

        // SHA pin: judge by the tags that point at it
        if RefKind::classify(current) == RefKind::Sha
            && let Ok((owner, repo)) = split_repository(repository)
        {
            let aliases = self.resolver.find_aliases(owner, repo, current, current);
            let verdicts: Vec<bool> = aliases
                .iter()
                .filter_map(|alias| is_below_major(alias, minimum))
                .collect();
            if !verdicts.is_empty() {
                return verdicts.iter().all(|below| *below);
            }
        }

        self.resolver
            .is_version_outdated(repository, current, minimum)
            .await
    }

    /// Suggest `latest` in the same shape as `current`
    async fn suggest_version(&self, repository: &str, current: &str, latest: &str) -> String {
        match RefKind::classify(current) {
            RefKind::Branch | RefKind::Tag => latest.to_string(),
            RefKind::Sha => match self.resolver.resolve_version(repository, latest).await {
                Some(sha) => sha,
                None => {
                    debug!(
                        "Could not resolve {}@{}, suggesting the tag",
                        repository, latest
                    );
                    latest.to_string()
                }
            },
        }
    }

    fn schema_changes(
        &self,
        from_repository: &str,
        from_version: &str,
        to_repository: &str,
        to_version: &str,
    ) -> Option<SchemaChanges> {
        self.patches
            .schema_changes(from_repository, from_version, to_repository, to_version)
    }

    fn issue(
        &self,
        reference: &DependencyReference,
        rule: &VersionRule,
        issue_type: IssueType,
        severity: Severity,
        suggested_version: &str,
        summary: String,
    ) -> Issue {
        let description = if rule.recommendation.is_empty() {
            summary
        } else {
            format!("{}. {}", summary, rule.recommendation)
        };

        Issue {
            repository: reference.repository.clone(),
            current_version: reference.version.clone(),
            suggested_version: suggested_version.to_string(),
            issue_type,
            severity,
            description,
            migration_target: None,
            schema_changes: None,
            location: reference.location.clone(),
        }
    }
}
