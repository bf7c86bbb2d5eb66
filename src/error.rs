use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("You need to be logged in to do that")]
    Unauthenticated,

    /// The backend rejected our token (HTTP 401).
    #[error("Session expired, please log in again")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("Backend responded with {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("Connection error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Local storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Request was cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Transport failures and 5xx responses are worth another attempt; anything the
    /// backend rejected on purpose is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(e) => !e.is_decode() && !e.is_builder(),
            ClientError::Api { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}
