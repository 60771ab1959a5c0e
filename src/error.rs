use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("movie not found: {0}")]
    NotFound(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{service} returned status {status}")]
    UpstreamStatus { service: &'static str, status: u16 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("popularity store failed: {0}")]
    Store(#[from] sqlx::Error),

    #[error("search is not configured")]
    SearchUnavailable,
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
