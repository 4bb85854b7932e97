//! Issue analysis against a deterministic remote

mod helper;

use std::sync::Arc;

use futures::future::join_all;

use action_audit::analyzer::{IssueType, Severity};
use action_audit::parser::DependencyReference;

use helper::{
    CHECKOUT_V3_SHA, CHECKOUT_V4_SHA, FixtureRemote, SETUP_NODE_V1_SHA, SETUP_NODE_V3_SHA,
    SETUP_NODE_V4_SHA, checkout_remote, create_analyzer, create_resolver,
};

fn kinds(issues: &[action_audit::analyzer::Issue]) -> Vec<(IssueType, Severity)> {
    issues.iter().map(|i| (i.issue_type, i.severity)).collect()
}

#[tokio::test]
async fn deprecated_tag_reports_deprecated_and_outdated() {
    let remote = Arc::new(checkout_remote());
    let analyzer = create_analyzer(&remote);

    let issues = analyzer
        .analyze_actions(&[DependencyReference::new("actions/checkout", "v1")])
        .await;

    assert_eq!(
        kinds(&issues),
        vec![
            (IssueType::Deprecated, Severity::High),
            (IssueType::Outdated, Severity::Medium),
        ]
    );
    assert!(issues.iter().all(|i| i.suggested_version == "v4"));
}

#[tokio::test]
async fn tag_equivalent_to_latest_is_clean() {
    let remote = Arc::new(checkout_remote());
    let analyzer = create_analyzer(&remote);

    let issues = analyzer
        .analyze_actions(&[DependencyReference::new("actions/checkout", "v4.2.1")])
        .await;

    assert!(issues.is_empty(), "{issues:?}");
}

#[tokio::test]
async fn sha_pin_is_suggested_the_sha_of_latest() {
    let remote = Arc::new(checkout_remote());
    let analyzer = create_analyzer(&remote);

    let issues = analyzer
        .analyze_actions(&[DependencyReference::new("actions/checkout", CHECKOUT_V3_SHA)])
        .await;

    assert_eq!(kinds(&issues), vec![(IssueType::Outdated, Severity::Medium)]);
    assert_eq!(issues[0].suggested_version, CHECKOUT_V4_SHA);
}

#[tokio::test]
async fn latest_and_branch_pins_make_no_remote_calls() {
    let remote = Arc::new(checkout_remote());
    let analyzer = create_analyzer(&remote);

    let issues = analyzer
        .analyze_actions(&[
            DependencyReference::new("actions/checkout", "v4"),
            DependencyReference::new("actions/checkout", "main"),
            DependencyReference::new("actions/checkout", "master"),
        ])
        .await;

    assert!(issues.is_empty());
    assert_eq!(remote.total_calls(), 0);
}

#[tokio::test]
async fn warmed_repository_answers_from_cache() {
    let remote = Arc::new(checkout_remote());
    let analyzer = create_analyzer(&remote);

    analyzer
        .analyze_actions(&[
            DependencyReference::new("actions/checkout", "v1"),
            DependencyReference::new("actions/checkout", "v3"),
            DependencyReference::new("actions/checkout", "v3.6.0"),
            DependencyReference::new("actions/checkout", "v4.2"),
        ])
        .await;

    // One resolution of v1, then a single tag listing serves everything else,
    // even though the remote suspends on every call
    assert_eq!(remote.resolve_calls(), 1);
    assert_eq!(remote.tag_calls(), 1);
}

#[tokio::test]
async fn interleaved_repositories_warm_once_each_and_keep_input_order() {
    let remote = Arc::new(checkout_remote().with_tags(
        "actions/setup-node",
        &[
            ("v1", SETUP_NODE_V1_SHA),
            ("v3", SETUP_NODE_V3_SHA),
            ("v4", SETUP_NODE_V4_SHA),
        ],
    ));
    let analyzer = create_analyzer(&remote);

    let issues = analyzer
        .analyze_actions(&[
            DependencyReference::new("actions/checkout", "v1"),
            DependencyReference::new("actions/setup-node", "v1"),
            DependencyReference::new("actions/checkout", "v3"),
            DependencyReference::new("actions/setup-node", "v3"),
            DependencyReference::new("actions/checkout", "v3.6.0"),
        ])
        .await;

    let found: Vec<(&str, &str, IssueType)> = issues
        .iter()
        .map(|i| (i.repository.as_str(), i.current_version.as_str(), i.issue_type))
        .collect();
    assert_eq!(
        found,
        vec![
            ("actions/checkout", "v1", IssueType::Deprecated),
            ("actions/checkout", "v1", IssueType::Outdated),
            ("actions/setup-node", "v1", IssueType::Deprecated),
            ("actions/setup-node", "v1", IssueType::Outdated),
            ("actions/checkout", "v3", IssueType::Outdated),
            ("actions/setup-node", "v3", IssueType::Outdated),
            ("actions/checkout", "v3.6.0", IssueType::Outdated),
        ]
    );
    // First reference of each repository resolves and lists tags; the rest hit the index
    assert_eq!(remote.resolve_calls(), 2);
    assert_eq!(remote.tag_calls(), 2);
}

#[tokio::test]
async fn concurrent_warm_ups_share_one_tag_listing() {
    let remote = Arc::new(checkout_remote());
    let resolver = create_resolver(&remote);

    let results =
        join_all((0..4).map(|_| resolver.ensure_comprehensive_cache("actions", "checkout"))).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(remote.tag_calls(), 1);
    assert_eq!(remote.resolve_calls(), 0);
}

#[tokio::test]
async fn references_skipped_by_composite_only_cost_no_remote_calls() {
    let remote = Arc::new(checkout_remote());
    let analyzer = create_analyzer(&remote).composite_only(true);

    let issues = analyzer
        .analyze_actions(&[
            DependencyReference::new("actions/checkout", "v1"),
            DependencyReference::new("actions/checkout", "v3"),
        ])
        .await;

    assert!(issues.is_empty());
    assert_eq!(remote.total_calls(), 0);
}

#[tokio::test]
async fn unavailable_remote_degrades_to_string_comparison() {
    let remote = Arc::new(FixtureRemote::unavailable());
    let analyzer = create_analyzer(&remote);

    let issues = analyzer
        .analyze_actions(&[
            DependencyReference::new("actions/checkout", "v4"),
            DependencyReference::new("actions/checkout", "v4.2.1"),
        ])
        .await;

    // v4.2.1 cannot be proven equivalent to v4 without the remote
    assert_eq!(kinds(&issues), vec![(IssueType::Outdated, Severity::Low)]);
    assert_eq!(issues[0].current_version, "v4.2.1");
}

#[tokio::test]
async fn equivalence_after_warm_up_matches_sha_comparison() {
    let remote = Arc::new(checkout_remote());
    let resolver = create_resolver(&remote);

    resolver
        .ensure_comprehensive_cache("actions", "checkout")
        .await
        .unwrap();
    let calls = remote.total_calls();

    assert!(
        resolver
            .are_versions_equivalent("actions/checkout", "v4", "v4.2.1")
            .await
    );
    assert!(
        !resolver
            .are_versions_equivalent("actions/checkout", "v3.6.0", "v4.2")
            .await
    );
    assert!(
        !resolver
            .is_version_outdated("actions/checkout", "v4.2", "v4")
            .await
    );
    assert_eq!(remote.total_calls(), calls);
    assert_eq!(
        resolver.find_aliases("actions", "checkout", CHECKOUT_V4_SHA, "v4"),
        vec!["v4.2".to_string(), "v4.2.1".to_string()]
    );
}

#[tokio::test]
async fn unmanaged_repository_is_clean() {
    let remote = Arc::new(checkout_remote());
    let analyzer = create_analyzer(&remote);

    let issues = analyzer
        .analyze_actions(&[DependencyReference::new("my-org/internal-action", "v0.1")])
        .await;

    assert!(issues.is_empty());
    assert_eq!(remote.total_calls(), 0);
}
