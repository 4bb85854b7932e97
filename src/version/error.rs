use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Reference not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Remote authority is offline")]
    Offline,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid repository identifier: {0:?} (expected owner/repo)")]
    InvalidRepository(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}
