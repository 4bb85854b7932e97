//! Remote authority that never answers

use std::collections::HashMap;

use crate::version::error::RemoteError;
use crate::version::remote::RemoteAuthority;

/// Remote authority used when no network access is wanted
///
/// Every lookup fails with [`RemoteError::Offline`], so resolver operations
/// degrade to plain string comparison.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineRemote;

#[async_trait::async_trait]
impl RemoteAuthority for OfflineRemote {
    async fn resolve_ref(
        &self,
        _owner: &str,
        _repo: &str,
        _git_ref: &str,
    ) -> Result<String, RemoteError> {
        Err(RemoteError::Offline)
    }

    async fn get_tags_for_repo(
        &self,
        _owner: &str,
        _repo: &str,
    ) -> Result<HashMap<String, String>, RemoteError> {
        Err(RemoteError::Offline)
    }
}
