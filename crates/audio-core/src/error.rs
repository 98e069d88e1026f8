//! Error types for audio-core

use thiserror::Error;

/// Main error type for audio-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for audio-core
pub type Result<T> = std::result::Result<T, Error>;
