//! Parser layer
//! - traits.rs: Parser trait definition
//! - types.rs: Common types (DependencyReference, SourceLocation)
//! - github_actions.rs: GitHub Actions workflow and composite action parser

pub mod github_actions;
pub mod traits;
pub mod types;

pub use github_actions::GitHubActionsParser;
pub use traits::{ParseError, Parser};
pub use types::{DependencyReference, SourceLocation};
