use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unexpected status {status} for {url}")]
    Status { status: reqwest::StatusCode, url: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed store data: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
