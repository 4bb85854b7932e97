//! Issue analysis layer
//!
//! Evaluates dependency references against maintained version rules,
//! asking the resolver whether a pin is really stale and the patch engine
//! what would have to change in its inputs.
//!
//! - [`rules`]: `VersionRule`, `RuleSet` and the default catalog
//! - [`types`]: `Issue`, `IssueType`, `Severity`
//! - [`checker`]: `IssueAnalyzer`

pub mod checker;
pub mod rules;
pub mod types;

pub use checker::IssueAnalyzer;
pub use rules::{RuleSet, VersionRule, default_rules};
pub use types::{Issue, IssueType, Severity};
