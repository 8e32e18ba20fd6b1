use thiserror::Error;

/// Errors surfaced by [`ApiService`](super::ApiService) calls.
///
/// Body decode failures are deliberately absent: a successful response whose
/// body cannot be decoded yields the empty value of the requested response type.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a status outside 200-299.
    #[error("API Error [{status}]: {body}")]
    Transport { status: u16, body: String },

    /// The request never produced a response (DNS, connect, TLS, ...).
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// A header name or value could not be put on the wire.
    #[error("Invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The request body could not be serialized to JSON.
    #[error("Failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failure reported by a non-reqwest transport.
    #[error("Transport failure: {0}")]
    Other(String),
}

impl ApiError {
    /// HTTP status carried by a [`ApiError::Transport`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
