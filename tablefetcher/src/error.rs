use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetcherError {
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FetcherError>;
