use thiserror::Error;

use crate::http::HttpError;

/// Failure talking to the directory API.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] HttpError),
    /// A response arrived but it was not the one we asked for.
    #[error("Unexpected response: {0}")]
    Protocol(String),
    #[error("Failed to decode response: {0}")]
    Decode(String),
    /// The token endpoint refused to issue a token.
    #[error("Token request rejected: {0}")]
    Auth(String),
}

impl ApiError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}
