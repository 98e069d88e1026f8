//! Error types for audio-stream

use thiserror::Error;

/// Streaming transcription error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The server rejected the session, or it failed before `ready`
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// An inbound frame could not be decoded
    #[error("Failed to decode frame: {0}")]
    Decode(String),

    /// An outbound frame could not be serialized; only inbound-only
    /// variants such as `Unknown` hit this
    #[error("Failed to encode frame: {0}")]
    Encode(String),

    /// The transport failed to open, read or write
    #[error("Transport error: {0}")]
    Transport(String),

    /// The base URL cannot be turned into a `ws`/`wss` stream URL
    #[error("Invalid stream URL: {0}")]
    InvalidUrl(String),

    /// Missing or empty handshake parameters
    #[error("Configuration error: {0}")]
    Config(String),

    /// `connect` was called on a session that already left `NotConnected`
    #[error("Stream session already started")]
    AlreadyStarted,

    /// The session was stopped before the handshake completed
    #[error("Stream closed before ready")]
    Closed,
}

/// Result type alias for audio-stream
pub type Result<T> = std::result::Result<T, StreamError>;
