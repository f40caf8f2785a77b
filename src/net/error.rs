//! Error type surfaced by every `ApiClient` call.

use super::transport::TransportError;

/// Failure of an API call after local recovery (retry) has been exhausted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server answered 401. The token has already been cleared and the
    /// page sent to the landing route.
    #[error("Unauthorized")]
    Unauthorized,
    /// A retryable status that was still failing when the retry budget ran out.
    #[error("{message}")]
    Server { status: u16, message: String },
    /// Any other non-2xx answer.
    #[error("{message}")]
    Application { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    /// The transport failed for a reason other than connectivity.
    #[error("transport error: {0}")]
    Transport(String),
    #[error("failed to encode request: {0}")]
    Encode(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Server { status, .. } | Self::Application { status, .. } => Some(*status),
            Self::Network(_) | Self::Transport(_) | Self::Encode(_) | Self::Decode(_) => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Network(msg) => Self::Network(msg),
            TransportError::Other(msg) => Self::Transport(msg),
        }
    }
}

pub(crate) fn request_failed_message(status: u16) -> String {
    format!("Request failed with status {status}")
}
