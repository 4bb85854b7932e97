//! Deterministic remote authority for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use action_audit::version::error::RemoteError;
use action_audit::version::remote::RemoteAuthority;

/// Remote authority answering from in-memory tag tables, counting every call
#[derive(Default)]
pub struct FixtureRemote {
    tags: HashMap<String, HashMap<String, String>>,
    unavailable: bool,
    resolve_calls: AtomicUsize,
    tag_calls: AtomicUsize,
}

impl FixtureRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote that fails every call as if rate limited
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with_tags(mut self, repository: &str, tags: &[(&str, &str)]) -> Self {
        self.tags.insert(
            repository.to_string(),
            tags.iter()
                .map(|(tag, sha)| (tag.to_string(), sha.to_string()))
                .collect(),
        );
        self
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn tag_calls(&self) -> usize {
        self.tag_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.resolve_calls() + self.tag_calls()
    }

    fn repository(&self, owner: &str, repo: &str) -> Result<&HashMap<String, String>, RemoteError> {
        if self.unavailable {
            return Err(RemoteError::RateLimited {
                retry_after_secs: Some(60),
            });
        }
        let repository = format!("{}/{}", owner, repo);
        self.tags
            .get(&repository)
            .ok_or(RemoteError::NotFound(repository))
    }
}

#[async_trait]
impl RemoteAuthority for FixtureRemote {
    async fn resolve_ref(&self, owner: &str, repo: &str, git_ref: &str) -> Result<String, RemoteError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        // Suspend like a network call so concurrent callers interleave
        tokio::task::yield_now().await;
        let tags = self.repository(owner, repo)?;

        if let Some(sha) = tags.get(git_ref) {
            return Ok(sha.clone());
        }
        // A commit SHA resolves to itself
        if tags.values().any(|sha| sha == git_ref) {
            return Ok(git_ref.to_string());
        }
        Err(RemoteError::NotFound(format!("{}/{}@{}", owner, repo, git_ref)))
    }

    async fn get_tags_for_repo(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<HashMap<String, String>, RemoteError> {
        self.tag_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.repository(owner, repo).cloned()
    }
}
