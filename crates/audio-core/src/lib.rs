//! audio-core: shared pieces of the audio client
//!
//! Configuration loading (TOML file, `${VAR}` expansion, environment
//! overrides) and the core error type used by the other crates.

pub mod config;
pub mod error;

pub use config::{ApiConfig, AudioConfig, StreamConfig};
pub use error::{Error, Result};
