use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the assistant backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, timeout and friends
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error! status: {status}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The task running the request died before reporting back
    #[error("request aborted: {0}")]
    Aborted(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
