//! Request and response types for the REST endpoints

use serde::{Deserialize, Serialize};

/// Voice used when a speech request does not name one
pub const DEFAULT_VOICE: &str = "alloy";

/// Payload for `POST /config/update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfigForm {
    /// Upstream speech provider URL
    pub url: String,
    /// Upstream provider key
    pub key: String,
    /// Model name
    pub model: String,
    /// Default speaker / voice
    pub speaker: String,
}

/// Batch transcription result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcription {
    /// Transcribed text
    #[serde(default)]
    pub text: String,
    /// Any additional fields the server returned
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Speech synthesis request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeechRequest {
    /// Text to speak
    pub input: String,
    /// Voice to speak with
    pub voice: String,
    /// Model override; the server default is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl SpeechRequest {
    /// Create a request for `text` with the default voice
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            input: text.into(),
            voice: DEFAULT_VOICE.to_string(),
            model: None,
        }
    }

    /// Set voice
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Set model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Synthesized audio returned by `POST /speech`
#[derive(Debug, Clone)]
pub struct SynthesizedSpeech {
    /// Encoded audio bytes as sent by the server
    pub audio_data: Vec<u8>,
    /// Content type reported by the server
    pub content_type: String,
}

impl SynthesizedSpeech {
    /// Get audio data as base64
    pub fn to_base64(&self) -> String {
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &self.audio_data)
    }
}

/// A transcription or synthesis model offered by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Response of `GET /models`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// A synthesis voice offered by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Response of `GET /voices`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoicesResponse {
    #[serde(default)]
    pub voices: Vec<VoiceInfo>,
}
