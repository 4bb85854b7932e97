//! Common types for parsers

use std::fmt;

use serde::Serialize;

use crate::patch::block::ConfigBlock;

/// Detect whether a path or URI points at a workflow or action definition
pub fn is_github_actions_file(uri: &str) -> bool {
    let is_github_dir = uri.contains(".github/workflows/")
        || uri.contains(".github\\workflows\\")
        || uri.contains(".github/actions/")
        || uri.contains(".github\\actions\\");
    let is_action_file = uri.ends_with("/action.yml")
        || uri.ends_with("/action.yaml")
        || uri.ends_with("\\action.yml")
        || uri.ends_with("\\action.yaml")
        || matches!(uri, "action.yml" | "action.yaml");
    let is_yaml = uri.ends_with(".yml") || uri.ends_with(".yaml");
    (is_github_dir && is_yaml) || is_action_file
}

/// Where a reference was found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// File the reference came from, when known
    pub file: Option<String>,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column of the `owner/repo@version` value (1-indexed)
    pub column: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

/// One pinned usage of an external action or reusable workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DependencyReference {
    /// Repository identifier (e.g., "actions/checkout")
    pub repository: String,
    /// Version string after `@` (tag, branch or commit SHA)
    pub version: String,
    /// Reusable workflow, or a step of a composite action
    pub is_composite: bool,
    /// Path inside the repository (e.g., "ec2" for "actions/aws/ec2@v1")
    pub path: Option<String>,
    /// Where in the file the reference sits (e.g., "jobs.build.steps[0]")
    pub context: String,
    pub location: SourceLocation,
    /// The `with:` block passed to the action
    pub with: ConfigBlock,
}

impl DependencyReference {
    pub fn new(repository: &str, version: &str) -> Self {
        Self {
            repository: repository.to_string(),
            version: version.to_string(),
            is_composite: false,
            path: None,
            context: String::new(),
            location: SourceLocation::default(),
            with: ConfigBlock::new(),
        }
    }

    pub fn composite(mut self, is_composite: bool) -> Self {
        self.is_composite = is_composite;
        self
    }

    pub fn with_block(mut self, with: ConfigBlock) -> Self {
        self.with = with;
        self
    }

    /// `owner/repo[/path]@version` as written in the file
    pub fn uses(&self) -> String {
        match &self.path {
            Some(path) => format!("{}/{}@{}", self.repository, path, self.version),
            None => format!("{}@{}", self.repository, self.version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(".github/workflows/ci.yml", true)]
    #[case(".github/workflows/release.yaml", true)]
    #[case("/home/user/project/.github/workflows/test.yml", true)]
    #[case("file:///home/user/.github/workflows/build.yml", true)]
    #[case(".github\\workflows\\ci.yml", true)]
    #[case(".github/actions/my-action/action.yml", true)]
    #[case("/repo/action.yaml", true)]
    #[case("action.yml", true)]
    #[case("/path/to/package.json", false)]
    #[case("workflow.yml", false)]
    #[case("random.txt", false)]
    fn is_github_actions_file_returns_expected(#[case] uri: &str, #[case] expected: bool) {
        assert_eq!(is_github_actions_file(uri), expected);
    }

    #[test]
    fn uses_includes_sub_path() {
        let mut reference = DependencyReference::new("actions/aws", "v1");
        assert_eq!(reference.uses(), "actions/aws@v1");

        reference.path = Some("ec2".to_string());
        assert_eq!(reference.uses(), "actions/aws/ec2@v1");
    }

    #[test]
    fn source_location_display_includes_file_when_known() {
        let location = SourceLocation {
            file: Some("ci.yml".to_string()),
            line: 7,
            column: 15,
        };
        assert_eq!(location.to_string(), "ci.yml:7:15");
        assert_eq!(SourceLocation::default().to_string(), "0:0");
    }
}
