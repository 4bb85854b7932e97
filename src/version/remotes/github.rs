//! GitHub REST API remote authority implementation

use std::collections::HashMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::version::error::RemoteError;
use crate::version::remote::RemoteAuthority;

/// Default base URL for GitHub API
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Page size used when listing tags
const TAGS_PER_PAGE: usize = 100;

/// Upper bound on tag pages fetched for one repository
const MAX_TAG_PAGES: usize = 20;

/// Annotated tags can point at other tag objects; stop peeling after this many hops
const MAX_TAG_PEEL_DEPTH: usize = 4;

/// Response from the git refs API (`/git/ref/{tags,heads}/{ref}`)
#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

/// Response from the git tags API (`/git/tags/{sha}`)
#[derive(Debug, Deserialize)]
struct AnnotatedTag {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct Commit {
    sha: String,
}

/// Entry from the tags listing API (`/tags`)
#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
    commit: Commit,
}

/// Remote authority backed by the GitHub REST API
pub struct GitHubRemote {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubRemote {
    /// Creates a new GitHubRemote with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("action-audit")
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Sends requests with `Authorization: Bearer <token>` when a token is given
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    fn repo_url(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{}/{}", self.base_url, owner, repo)
    }

    /// GET a JSON document. Returns `Ok(None)` when GitHub reports the object
    /// does not exist (404, or 422 for unparseable commit refs).
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, RemoteError> {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            debug!("GitHub API returned {} for {}", status, url);
            return Ok(None);
        }

        let exhausted = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "0");

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || (status == reqwest::StatusCode::FORBIDDEN && exhausted)
        {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(RemoteError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(RemoteError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let body = response.json::<T>().await.map_err(|e| {
            warn!("Failed to parse GitHub response from {}: {}", url, e);
            RemoteError::InvalidResponse(e.to_string())
        })?;

        Ok(Some(body))
    }

    /// Follows annotated tag objects down to the commit they point at
    async fn peel_tag(&self, repo_url: &str, mut object: GitObject) -> Result<String, RemoteError> {
        for _ in 0..MAX_TAG_PEEL_DEPTH {
            if object.kind != "tag" {
                return Ok(object.sha);
            }
            let url = format!("{}/git/tags/{}", repo_url, object.sha);
            let Some(tag) = self.get_json::<AnnotatedTag>(&url).await? else {
                return Err(RemoteError::InvalidResponse(format!(
                    "Dangling tag object {}",
                    object.sha
                )));
            };
            object = tag.object;
        }
        Err(RemoteError::InvalidResponse(format!(
            "Tag chain deeper than {} objects",
            MAX_TAG_PEEL_DEPTH
        )))
    }
}

impl Default for GitHubRemote {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait::async_trait]
impl RemoteAuthority for GitHubRemote {
    async fn resolve_ref(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<String, RemoteError> {
        let repo_url = self.repo_url(owner, repo);

        let tag_url = format!("{}/git/ref/tags/{}", repo_url, git_ref);
        if let Some(found) = self.get_json::<GitRef>(&tag_url).await? {
            return self.peel_tag(&repo_url, found.object).await;
        }

        let branch_url = format!("{}/git/ref/heads/{}", repo_url, git_ref);
        if let Some(found) = self.get_json::<GitRef>(&branch_url).await? {
            return Ok(found.object.sha);
        }

        let commit_url = format!("{}/commits/{}", repo_url, git_ref);
        if let Some(commit) = self.get_json::<Commit>(&commit_url).await? {
            return Ok(commit.sha);
        }

        Err(RemoteError::NotFound(format!("{}/{}@{}", owner, repo, git_ref)))
    }

    async fn get_tags_for_repo(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<HashMap<String, String>, RemoteError> {
        let repo_url = self.repo_url(owner, repo);
        let mut tags = HashMap::new();

        for page in 1..=MAX_TAG_PAGES {
            let url = format!("{}/tags?per_page={}&page={}", repo_url, TAGS_PER_PAGE, page);
            let Some(batch) = self.get_json::<Vec<Tag>>(&url).await? else {
                return Err(RemoteError::NotFound(format!("{}/{}", owner, repo)));
            };

            let count = batch.len();
            tags.extend(batch.into_iter().map(|t| (t.name, t.commit.sha)));

            if count < TAGS_PER_PAGE {
                break;
            }
        }

        debug!("Fetched {} tags for {}/{}", tags.len(), owner, repo);
        Ok(tags)
    }
}
