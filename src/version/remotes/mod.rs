//! Remote authority implementations

pub mod github;
pub mod offline;

pub use github::GitHubRemote;
pub use offline::OfflineRemote;
