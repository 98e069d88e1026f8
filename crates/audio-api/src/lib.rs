//! audio-api: REST client for the audio service
//!
//! Thin request/response wrappers over the service's HTTP endpoints.
//! Every call carries the bearer token and turns a non-2xx response into
//! [`ApiError::Server`] holding the server-reported `detail`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use audio_api::{AudioApiClient, SpeechRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AudioApiClient::new("http://localhost:8080/api/v1/audio", Some("token"))?;
//!
//!     let audio = std::fs::read("recording.wav")?;
//!     let result = client.transcribe(&audio, "recording.wav", Some("nl")).await?;
//!     println!("Transcription: {}", result.text);
//!
//!     let speech = client.synthesize_speech(&SpeechRequest::new("Hallo!")).await?;
//!     std::fs::write("hallo.mp3", &speech.audio_data)?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::AudioApiClient;
pub use error::{ApiError, Result};
pub use types::{
    AudioConfigForm, ModelInfo, ModelsResponse, SpeechRequest, SynthesizedSpeech, Transcription,
    VoiceInfo, VoicesResponse, DEFAULT_VOICE,
};
