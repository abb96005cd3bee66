use std::time::Duration;

use thiserror::Error;

/// Transport-level failure retrieving source content.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("source did not answer within {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("request to source failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("source answered with http status {0}")]
    Status(u16),
}

/// Failure that aborts a whole extraction attempt.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("malformed feed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected content type `{0}`")]
    UnexpectedContent(String),
}

impl PipelineError {
    /// Stage label written alongside failure records.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Fetch(_) => "fetch",
            PipelineError::Json(_) | PipelineError::UnexpectedContent(_) => "parse",
        }
    }
}

/// Failure inside one extraction strategy. Never escapes the cascade.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
    #[error("unexpected source shape: {0}")]
    Shape(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("snapshot payload error: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("stored timestamp `{0}` is not rfc3339")]
    Timestamp(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store connection lock poisoned")]
    Poisoned,
}
