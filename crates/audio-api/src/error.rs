//! Error types for audio-api

use thiserror::Error;

/// REST client error type
#[derive(Error, Debug)]
pub enum ApiError {
    /// Non-2xx response; `detail` is what the server reported
    #[error("API error ({status}): {detail}")]
    Server { status: u16, detail: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// The server-reported failure reason, if this is a server error
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Server { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;
