//! Version rules and the rule set the analyzer evaluates against

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maintained knowledge about one action repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRule {
    pub repository: String,
    pub latest_version: String,
    /// Versions below this are reported with high severity
    #[serde(default)]
    pub minimum_version: Option<String>,
    #[serde(default)]
    pub deprecated_versions: BTreeSet<String>,
    /// Versions with a known vulnerability
    #[serde(default)]
    pub insecure_versions: BTreeSet<String>,
    /// Advisory reference for `insecure_versions` (e.g. a CVE id)
    #[serde(default)]
    pub advisory: Option<String>,
    #[serde(default)]
    pub migrate_to_repository: Option<String>,
    /// Version to use after migrating; defaults to `latest_version`
    #[serde(default)]
    pub migrate_to_version: Option<String>,
    #[serde(default)]
    pub recommendation: String,
}

impl VersionRule {
    pub fn new(repository: &str, latest_version: &str) -> Self {
        Self {
            repository: repository.to_string(),
            latest_version: latest_version.to_string(),
            minimum_version: None,
            deprecated_versions: BTreeSet::new(),
            insecure_versions: BTreeSet::new(),
            advisory: None,
            migrate_to_repository: None,
            migrate_to_version: None,
            recommendation: String::new(),
        }
    }

    pub fn minimum(mut self, version: &str) -> Self {
        self.minimum_version = Some(version.to_string());
        self
    }

    pub fn deprecated(mut self, versions: &[&str]) -> Self {
        self.deprecated_versions = versions.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn insecure(mut self, versions: &[&str], advisory: &str) -> Self {
        self.insecure_versions = versions.iter().map(|v| v.to_string()).collect();
        self.advisory = Some(advisory.to_string());
        self
    }

    pub fn migrate_to(mut self, repository: &str, version: &str) -> Self {
        self.migrate_to_repository = Some(repository.to_string());
        self.migrate_to_version = Some(version.to_string());
        self
    }

    pub fn recommend(mut self, recommendation: &str) -> Self {
        self.recommendation = recommendation.to_string();
        self
    }

    /// `repository@version` to migrate to, if the rule declares a migration
    pub fn migration_target(&self) -> Option<(&str, &str)> {
        let repository = self.migrate_to_repository.as_deref()?;
        let version = self
            .migrate_to_version
            .as_deref()
            .unwrap_or(&self.latest_version);
        Some((repository, version))
    }
}

/// Rules keyed by repository
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: HashMap<String, VersionRule>,
}

impl RuleSet {
    pub fn from_rules(rules: impl IntoIterator<Item = VersionRule>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|rule| (rule.repository.clone(), rule))
                .collect(),
        }
    }

    /// Built-in rules
    pub fn defaults() -> Self {
        Self::from_rules(default_rules())
    }

    /// Replace rules by repository. A custom rule replaces the whole record
    /// sharing its key; fields are never merged.
    pub fn with_custom(mut self, custom: impl IntoIterator<Item = VersionRule>) -> Self {
        for rule in custom {
            if self.rules.contains_key(&rule.repository) {
                debug!("Custom rule replaces default for {}", rule.repository);
            }
            self.rules.insert(rule.repository.clone(), rule);
        }
        self
    }

    pub fn get(&self, repository: &str) -> Option<&VersionRule> {
        self.rules.get(repository)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionRule> {
        self.rules.values()
    }
}

/// Default rule catalog for widely used actions
pub fn default_rules() -> Vec<VersionRule> {
    vec![
        VersionRule::new("actions/checkout", "v4")
            .deprecated(&["v1", "v2"])
            .recommend("Upgrade to actions/checkout@v4 (Node 20 runtime)"),
        VersionRule::new("actions/setup-node", "v4")
            .minimum("v3")
            .deprecated(&["v1", "v2"])
            .recommend("Upgrade to actions/setup-node@v4 and set `node-version`"),
        VersionRule::new("actions/setup-python", "v5")
            .minimum("v4")
            .deprecated(&["v1", "v2", "v3"])
            .recommend("Upgrade to actions/setup-python@v5"),
        VersionRule::new("actions/setup-go", "v5")
            .minimum("v4")
            .deprecated(&["v1", "v2", "v3"])
            .recommend("Upgrade to actions/setup-go@v5; caching is enabled by default"),
        VersionRule::new("actions/setup-java", "v4")
            .minimum("v3")
            .deprecated(&["v1"])
            .recommend("Upgrade to actions/setup-java@v4 and set `distribution`"),
        VersionRule::new("actions/cache", "v4")
            .minimum("v4")
            .deprecated(&["v1", "v2", "v3"])
            .recommend("Cache service v1 was shut down; only actions/cache@v4 keeps working"),
        VersionRule::new("actions/upload-artifact", "v4")
            .minimum("v4")
            .deprecated(&["v1", "v2", "v3"])
            .recommend("Artifact actions below v4 no longer run on github.com"),
        VersionRule::new("actions/download-artifact", "v4")
            .minimum("v4")
            .deprecated(&["v1", "v2", "v3"])
            .recommend("Artifact actions below v4 no longer run on github.com"),
        VersionRule::new("actions/github-script", "v7")
            .deprecated(&["v1", "v2", "v3", "v4", "v5"])
            .recommend("Upgrade to actions/github-script@v7"),
        VersionRule::new("actions/create-release", "v1")
            .migrate_to("softprops/action-gh-release", "v2")
            .recommend("actions/create-release is archived; use softprops/action-gh-release"),
        VersionRule::new("actions/upload-release-asset", "v1")
            .migrate_to("softprops/action-gh-release", "v2")
            .recommend("actions/upload-release-asset is archived; attach files with softprops/action-gh-release"),
        VersionRule::new("actions-rs/toolchain", "v1")
            .migrate_to("dtolnay/rust-toolchain", "stable")
            .recommend("actions-rs is unmaintained; use dtolnay/rust-toolchain"),
        VersionRule::new("tj-actions/changed-files", "v46")
            .minimum("v46")
            .insecure(
                &["v1", "v35", "v39", "v40", "v41", "v42", "v43", "v44", "v45"],
                "CVE-2025-30066: tags were repointed to a commit that leaks secrets to logs",
            )
            .recommend("Pin tj-actions/changed-files to a reviewed commit SHA of v46 or later"),
    ]
}
