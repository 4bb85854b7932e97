//! Shared test utilities
#![allow(dead_code)]

pub mod remote;

pub use remote::FixtureRemote;

use std::sync::Arc;

use action_audit::analyzer::{IssueAnalyzer, RuleSet};
use action_audit::patch::PatchEngine;
use action_audit::version::remote::RemoteAuthority;
use action_audit::version::resolver::VersionResolver;

pub const HOUR_MS: i64 = 60 * 60 * 1000;

pub const CHECKOUT_V4_SHA: &str = "11bd71901bbe5b1630ceea73d27597364c9af683";
pub const CHECKOUT_V3_SHA: &str = "f43a0e5ff2bd294095638e18286ca9a3d1956744";
pub const CHECKOUT_V1_SHA: &str = "50fbc622fc4ef5163becd7fab6573eac35f8462e";

pub const SETUP_NODE_V4_SHA: &str = "49933ea5288caeca8642d1e84afbd3f7d6820020";
pub const SETUP_NODE_V3_SHA: &str = "1a4442cacd436585916779262731d5b162bc6ec7";
pub const SETUP_NODE_V1_SHA: &str = "f1f314fca9dfce2769ece7d933488f076716723e";

/// Tags of actions/checkout as the fixture remote knows them
pub fn checkout_remote() -> FixtureRemote {
    FixtureRemote::new().with_tags(
        "actions/checkout",
        &[
            ("v1", CHECKOUT_V1_SHA),
            ("v3", CHECKOUT_V3_SHA),
            ("v3.6.0", CHECKOUT_V3_SHA),
            ("v4", CHECKOUT_V4_SHA),
            ("v4.2", CHECKOUT_V4_SHA),
            ("v4.2.1", CHECKOUT_V4_SHA),
        ],
    )
}

pub fn create_resolver(remote: &Arc<FixtureRemote>) -> Arc<VersionResolver> {
    let remote: Arc<dyn RemoteAuthority> = remote.clone();
    Arc::new(VersionResolver::new(remote, HOUR_MS))
}

/// Analyzer over the default rules and patch catalog
pub fn create_analyzer(remote: &Arc<FixtureRemote>) -> IssueAnalyzer {
    IssueAnalyzer::new(
        RuleSet::defaults(),
        create_resolver(remote),
        Arc::new(PatchEngine::default()),
    )
}
