//! Cache-first version resolution and comparison
//!
//! Every public comparison degrades to plain string comparison when the
//! remote authority cannot answer; none of them return an error.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::version::cache::{CacheStats, ResolutionCache};
use crate::version::error::ResolveError;
use crate::version::remote::RemoteAuthority;
use crate::version::remotes::OfflineRemote;
use crate::version::semver::is_branch;

/// Split `owner/repo` (or `owner/repo/sub/path`) into owner and repository
pub fn split_repository(repository: &str) -> Result<(&str, &str), ResolveError> {
    let mut parts = repository.split('/');
    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => Ok((owner, repo)),
        _ => Err(ResolveError::InvalidRepository(repository.to_string())),
    }
}

pub struct VersionResolver {
    remote: Arc<dyn RemoteAuthority>,
    cache: ResolutionCache,
    /// One gate per repository so concurrent warm-ups share a single tag listing
    warmups: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl VersionResolver {
    pub fn new(remote: Arc<dyn RemoteAuthority>, ttl_ms: i64) -> Self {
        Self {
            remote,
            cache: ResolutionCache::new(ttl_ms),
            warmups: Mutex::new(HashMap::new()),
        }
    }

    /// Resolver without remote access; comparisons are plain string comparisons
    pub fn offline() -> Self {
        Self::new(Arc::new(OfflineRemote), 0)
    }

    /// Resolve a ref to its commit SHA
    ///
    /// Lookup order: the per-ref cache, the repository's tag index, then the
    /// remote authority. A successful remote lookup also warms the tag index
    /// so sibling versions of the same repository become cache hits.
    pub async fn resolve_ref(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<String, ResolveError> {
        if let Some(sha) = self.cache.get_ref(owner, repo, git_ref) {
            return Ok(sha);
        }

        if let Some(index) = self.cache.get_tag_index(owner, repo)
            && let Some(sha) = index.sha_for(git_ref)
        {
            return Ok(sha.to_string());
        }

        let sha = self
            .remote
            .resolve_ref(owner, repo, git_ref)
            .await
            .inspect_err(|e| debug!("Failed to resolve {}/{}@{}: {}", owner, repo, git_ref, e))?;

        self.cache.put_ref(owner, repo, git_ref, &sha);

        if let Err(e) = self.ensure_comprehensive_cache(owner, repo).await {
            debug!("Skipping tag index warm-up for {}/{}: {}", owner, repo, e);
        }

        Ok(sha)
    }

    /// Fetch and cache every tag of a repository unless a fresh index exists
    pub async fn ensure_comprehensive_cache(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<(), ResolveError> {
        if self.cache.get_tag_index(owner, repo).is_some() {
            return Ok(());
        }

        let gate = self.warmup_gate(owner, repo);
        let _warming = gate.lock().await;
        // Another caller may have finished the warm-up while we waited
        if self.cache.get_tag_index(owner, repo).is_some() {
            return Ok(());
        }

        let tags = self.remote.get_tags_for_repo(owner, repo).await?;
        let index = self.cache.put_tag_index(owner, repo, tags);
        info!("Indexed {} tags for {}/{}", index.len(), owner, repo);
        Ok(())
    }

    fn warmup_gate(&self, owner: &str, repo: &str) -> Arc<AsyncMutex<()>> {
        let key = format!("{}/{}", owner, repo).to_ascii_lowercase();
        self.warmups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_default()
            .clone()
    }

    /// Whether two versions of a repository point at the same commit
    ///
    /// Uses the cached tag index when both versions are in it; otherwise
    /// resolves each version. Falls back to `v1 == v2` on any failure.
    pub async fn are_versions_equivalent(&self, repository: &str, v1: &str, v2: &str) -> bool {
        if v1 == v2 {
            return true;
        }

        let (owner, repo) = match split_repository(repository) {
            Ok(parts) => parts,
            Err(e) => {
                debug!("{}", e);
                return false;
            }
        };

        if let Some(index) = self.cache.get_tag_index(owner, repo)
            && let (Some(a), Some(b)) = (index.sha_for(v1), index.sha_for(v2))
        {
            return a == b;
        }

        match self.resolve_pair(owner, repo, v1, v2).await {
            Ok((a, b)) => a == b,
            Err(e) => {
                debug!(
                    "Comparing {}@{} and {} as strings: {}",
                    repository, v1, v2, e
                );
                false
            }
        }
    }

    async fn resolve_pair(
        &self,
        owner: &str,
        repo: &str,
        v1: &str,
        v2: &str,
    ) -> Result<(String, String), ResolveError> {
        let a = self.resolve_ref(owner, repo, v1).await?;
        let b = self.resolve_ref(owner, repo, v2).await?;
        Ok((a, b))
    }

    /// Whether `current` is behind `latest`
    ///
    /// Identical strings and branch references are never outdated.
    pub async fn is_version_outdated(&self, repository: &str, current: &str, latest: &str) -> bool {
        if current == latest || is_branch(current) {
            return false;
        }
        !self.are_versions_equivalent(repository, current, latest).await
    }

    /// Resolve a version of `owner/repo` to its SHA, or None on any failure
    pub async fn resolve_version(&self, repository: &str, version: &str) -> Option<String> {
        let (owner, repo) = split_repository(repository).ok()?;
        self.resolve_ref(owner, repo, version).await.ok()
    }

    /// Cached tags pointing at `sha`, excluding `exclude_version`
    pub fn find_aliases(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        exclude_version: &str,
    ) -> Vec<String> {
        let Some(index) = self.cache.get_tag_index(owner, repo) else {
            return vec![];
        };
        index
            .aliases(sha)
            .iter()
            .filter(|alias| alias.as_str() != exclude_version)
            .cloned()
            .collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
