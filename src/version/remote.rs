//! Remote authority trait for resolving references to commit SHAs

use std::collections::HashMap;

#[cfg(test)]
use mockall::automock;

use crate::version::error::RemoteError;

/// Capability for looking up commit identities of a repository's refs
///
/// Real network clients, deterministic fixtures and replay doubles all
/// implement this; the resolver never depends on a concrete client.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Resolves a ref to a commit SHA
    ///
    /// The ref is tried as a tag, then as a branch, then as a commit.
    ///
    /// # Returns
    /// * `Ok(String)` - The commit SHA the ref points to
    /// * `Err(RemoteError::NotFound)` - If none of the three interpretations apply
    async fn resolve_ref(&self, owner: &str, repo: &str, git_ref: &str)
    -> Result<String, RemoteError>;

    /// Fetches every tag of a repository together with the commit it points to
    async fn get_tags_for_repo(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<HashMap<String, String>, RemoteError>;
}
