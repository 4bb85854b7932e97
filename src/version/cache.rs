//! Two-tier in-memory cache for ref resolution
//!
//! - Tier 1 maps a single `(owner, repo, ref)` to the commit SHA it resolved to.
//! - Tier 2 holds a [`TagIndex`]: every tag of one repository with its SHA,
//!   plus the reverse SHA -> aliases map.
//!
//! Entries are immutable once written. A stale entry is ignored on read and
//! replaced wholesale by the next write; nothing is mutated in place.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

/// Every known tag of one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagIndex {
    version_to_sha: HashMap<String, String>,
    sha_to_aliases: HashMap<String, Vec<String>>,
    cached_at: i64,
}

impl TagIndex {
    /// Build the index and its reverse map from a tag -> SHA listing
    pub fn new(tags: HashMap<String, String>, cached_at: i64) -> Self {
        let mut sha_to_aliases: HashMap<String, Vec<String>> = HashMap::new();
        for (tag, sha) in &tags {
            sha_to_aliases
                .entry(sha.clone())
                .or_default()
                .push(tag.clone());
        }
        for aliases in sha_to_aliases.values_mut() {
            aliases.sort();
        }

        Self {
            version_to_sha: tags,
            sha_to_aliases,
            cached_at,
        }
    }

    /// SHA for a version string. A full commit SHA that some tag points at
    /// resolves to itself.
    pub fn sha_for(&self, version: &str) -> Option<&str> {
        if let Some(sha) = self.version_to_sha.get(version) {
            return Some(sha);
        }
        self.sha_to_aliases
            .get_key_value(version)
            .map(|(sha, _)| sha.as_str())
    }

    /// Tags pointing at `sha`, sorted
    pub fn aliases(&self, sha: &str) -> &[String] {
        self.sha_to_aliases
            .get(sha)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.version_to_sha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.version_to_sha.is_empty()
    }
}

#[derive(Debug, Clone)]
struct ResolvedRef {
    sha: String,
    cached_at: i64,
}

/// Entry counts for both cache tiers, including expired entries not yet replaced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub refs: usize,
    pub repositories: usize,
}

pub struct ResolutionCache {
    refs: RwLock<HashMap<String, ResolvedRef>>,
    repositories: RwLock<HashMap<String, Arc<TagIndex>>>,
    ttl_ms: i64,
}

impl ResolutionCache {
    pub fn new(ttl_ms: i64) -> Self {
        Self {
            refs: RwLock::new(HashMap::new()),
            repositories: RwLock::new(HashMap::new()),
            ttl_ms,
        }
    }

    /// Get current timestamp in milliseconds since UNIX epoch
    fn current_timestamp_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn is_fresh(&self, cached_at: i64) -> bool {
        Self::current_timestamp_ms() - cached_at < self.ttl_ms
    }

    // GitHub owner and repository names are case-insensitive
    fn repository_key(owner: &str, repo: &str) -> String {
        format!("{}/{}", owner, repo).to_ascii_lowercase()
    }

    fn ref_key(owner: &str, repo: &str, git_ref: &str) -> String {
        format!("{}@{}", Self::repository_key(owner, repo), git_ref)
    }

    /// Fresh SHA for a single ref, if cached
    pub fn get_ref(&self, owner: &str, repo: &str, git_ref: &str) -> Option<String> {
        let key = Self::ref_key(owner, repo, git_ref);
        let refs = self.refs.read().unwrap_or_else(PoisonError::into_inner);
        refs.get(&key)
            .filter(|entry| self.is_fresh(entry.cached_at))
            .map(|entry| entry.sha.clone())
    }

    pub fn put_ref(&self, owner: &str, repo: &str, git_ref: &str, sha: &str) {
        let key = Self::ref_key(owner, repo, git_ref);
        let entry = ResolvedRef {
            sha: sha.to_string(),
            cached_at: Self::current_timestamp_ms(),
        };
        self.refs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }

    /// Fresh tag index for a repository, if cached
    pub fn get_tag_index(&self, owner: &str, repo: &str) -> Option<Arc<TagIndex>> {
        let key = Self::repository_key(owner, repo);
        let repositories = self
            .repositories
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        repositories
            .get(&key)
            .filter(|index| self.is_fresh(index.cached_at))
            .cloned()
    }

    /// Store a full tag listing, replacing any previous index for the repository
    pub fn put_tag_index(
        &self,
        owner: &str,
        repo: &str,
        tags: HashMap<String, String>,
    ) -> Arc<TagIndex> {
        let key = Self::repository_key(owner, repo);
        // Build outside the lock so writers hold it only for the insert
        let index = Arc::new(TagIndex::new(tags, Self::current_timestamp_ms()));
        debug!("Caching {} tags for {}", index.len(), key);
        self.repositories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&index));
        index
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            refs: self.refs.read().unwrap_or_else(PoisonError::into_inner).len(),
            repositories: self
                .repositories
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
        }
    }

    pub fn clear(&self) {
        self.refs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.repositories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: i64 = 60 * 60 * 1000;

    fn checkout_tags() -> HashMap<String, String> {
        HashMap::from([
            ("v4".to_string(), "aaa".to_string()),
            ("v4.2.1".to_string(), "aaa".to_string()),
            ("v4.2.0".to_string(), "bbb".to_string()),
        ])
    }

    #[test]
    fn tag_index_builds_sorted_reverse_map() {
        let index = TagIndex::new(checkout_tags(), 0);

        assert_eq!(index.aliases("aaa"), ["v4".to_string(), "v4.2.1".to_string()]);
        assert_eq!(index.aliases("bbb"), ["v4.2.0".to_string()]);
        assert!(index.aliases("ccc").is_empty());
    }

    #[test]
    fn tag_index_resolves_known_sha_to_itself() {
        let index = TagIndex::new(checkout_tags(), 0);

        assert_eq!(index.sha_for("v4.2.1"), Some("aaa"));
        assert_eq!(index.sha_for("bbb"), Some("bbb"));
        assert_eq!(index.sha_for("v3"), None);
    }

    #[test]
    fn get_ref_returns_cached_sha_until_expiry() {
        let cache = ResolutionCache::new(HOUR_MS);
        cache.put_ref("actions", "checkout", "v4", "aaa");

        assert_eq!(
            cache.get_ref("actions", "checkout", "v4"),
            Some("aaa".to_string())
        );
        assert_eq!(cache.get_ref("actions", "checkout", "v3"), None);
    }

    #[test]
    fn repository_keys_ignore_case() {
        let cache = ResolutionCache::new(HOUR_MS);
        cache.put_ref("Actions", "Checkout", "v4", "aaa");
        cache.put_tag_index("Actions", "Checkout", checkout_tags());

        assert_eq!(
            cache.get_ref("actions", "checkout", "v4"),
            Some("aaa".to_string())
        );
        assert!(cache.get_tag_index("actions", "checkout").is_some());
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let cache = ResolutionCache::new(0);
        cache.put_ref("actions", "checkout", "v4", "aaa");
        cache.put_tag_index("actions", "checkout", checkout_tags());

        assert_eq!(cache.get_ref("actions", "checkout", "v4"), None);
        assert!(cache.get_tag_index("actions", "checkout").is_none());
        assert_eq!(
            cache.stats(),
            CacheStats {
                refs: 1,
                repositories: 1
            }
        );
    }

    #[test]
    fn put_tag_index_replaces_previous_index() {
        let cache = ResolutionCache::new(HOUR_MS);
        cache.put_tag_index("actions", "checkout", checkout_tags());
        cache.put_tag_index(
            "actions",
            "checkout",
            HashMap::from([("v5".to_string(), "ccc".to_string())]),
        );

        let index = cache.get_tag_index("actions", "checkout").unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.sha_for("v4"), None);
        assert_eq!(index.sha_for("v5"), Some("ccc"));
    }

    #[test]
    fn clear_drops_both_tiers() {
        let cache = ResolutionCache::new(HOUR_MS);
        cache.put_ref("actions", "checkout", "v4", "aaa");
        cache.put_tag_index("actions", "checkout", checkout_tags());

        cache.clear();

        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn concurrent_writers_leave_a_consistent_index() {
        let cache = Arc::new(ResolutionCache::new(HOUR_MS));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.put_tag_index("actions", "checkout", checkout_tags());
                    cache.get_tag_index("actions", "checkout").is_some()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        let index = cache.get_tag_index("actions", "checkout").unwrap();
        assert_eq!(index.sha_for("v4"), Some("aaa"));
    }
}
