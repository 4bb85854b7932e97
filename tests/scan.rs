//! Workflow file to issues and patches, end to end

mod helper;

use std::sync::Arc;

use serde_json::json;

use action_audit::analyzer::{IssueType, Severity};
use action_audit::parser::{GitHubActionsParser, Parser};
use action_audit::patch::{PatchEngine, block};

use helper::{checkout_remote, create_analyzer};

const WORKFLOW: &str = r#"name: CI
on: push
jobs:
  build:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v1
        with:
          token: abc123
          submodules: true
      - uses: actions/setup-node@v4
        with:
          node-version: 20
      - run: npm test
  release:
    needs: build
    runs-on: ubuntu-latest
    steps:
      - uses: actions/create-release@v1
        with:
          release_name: Release
  shared:
    uses: my-org/workflows/.github/workflows/lint.yml@v2
"#;

const COMPOSITE_ACTION: &str = r#"name: setup
runs:
  using: composite
  steps:
    - uses: actions/setup-node@v2
    - uses: ./local-action
"#;

#[tokio::test]
async fn workflow_issues_carry_file_locations() {
    let parser = GitHubActionsParser::for_file(".github/workflows/ci.yml");
    assert!(parser.can_parse(".github/workflows/ci.yml"));
    let references = parser.parse(WORKFLOW).unwrap();
    assert_eq!(references.len(), 4);

    let remote = Arc::new(checkout_remote());
    let issues = create_analyzer(&remote).analyze_actions(&references).await;

    let found: Vec<(&str, IssueType, Severity)> = issues
        .iter()
        .map(|i| (i.repository.as_str(), i.issue_type, i.severity))
        .collect();
    assert_eq!(
        found,
        vec![
            ("actions/checkout", IssueType::Deprecated, Severity::High),
            ("actions/checkout", IssueType::Outdated, Severity::Medium),
            ("actions/create-release", IssueType::Migration, Severity::Medium),
        ]
    );

    let location = &issues[0].location;
    assert_eq!(location.file.as_deref(), Some(".github/workflows/ci.yml"));
    assert_eq!((location.line, location.column), (7, 15));
    assert_eq!(issues[2].location.line, 19);
}

#[test]
fn parsed_inputs_feed_the_patch_engine() {
    let references = GitHubActionsParser::new().parse(WORKFLOW).unwrap();
    let engine = PatchEngine::default();

    let checkout = &references[0];
    let patch = engine.preview_changes(
        &checkout.repository,
        &checkout.version,
        "v4",
        Some(&checkout.with),
    );
    assert!(patch.applied);
    assert_eq!(
        block::to_json(&patch.after),
        json!({ "submodules": true, "fetch-depth": 1 })
    );

    let release = references
        .iter()
        .find(|r| r.repository == "actions/create-release")
        .unwrap();
    let patch = engine.preview_changes_with_location(
        &release.repository,
        &release.version,
        "v2",
        "softprops/action-gh-release",
        Some(&release.with),
    );
    assert_eq!(block::to_json(&patch.after), json!({ "name": "Release" }));
}

#[tokio::test]
async fn composite_only_limits_analysis_to_composite_references() {
    let mut references = GitHubActionsParser::new().parse(WORKFLOW).unwrap();
    references.extend(GitHubActionsParser::new().parse(COMPOSITE_ACTION).unwrap());

    let remote = Arc::new(checkout_remote());
    let analyzer = create_analyzer(&remote).composite_only(true);
    let issues = analyzer.analyze_actions(&references).await;

    let found: Vec<(&str, &str, IssueType)> = issues
        .iter()
        .map(|i| (i.repository.as_str(), i.current_version.as_str(), i.issue_type))
        .collect();
    assert_eq!(
        found,
        vec![
            ("actions/setup-node", "v2", IssueType::Deprecated),
            ("actions/setup-node", "v2", IssueType::Outdated),
        ]
    );
    assert!(issues.iter().all(|i| i.severity == Severity::High));
}
