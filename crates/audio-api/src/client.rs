//! Audio service REST client
//!
//! Each call is a single request/response. Failures are unwrapped the same
//! way everywhere: a non-2xx status becomes [`ApiError::Server`] with the
//! `detail` field of the JSON error body.

use audio_core::ApiConfig;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::error::{ApiError, Result};
use crate::types::{
    AudioConfigForm, ModelsResponse, SpeechRequest, SynthesizedSpeech, Transcription,
    VoicesResponse,
};

/// Error body returned by the service
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// REST client for the audio endpoints
#[derive(Clone)]
pub struct AudioApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl AudioApiClient {
    /// Create a new client for `base_url`
    pub fn new(base_url: impl Into<String>, token: Option<&str>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
        })
    }

    /// Create a client from the `[api]` configuration section
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(config.base_url.clone(), config.token.as_deref())
    }

    /// Base URL every endpoint path is appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn add_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and unwrap non-2xx responses into [`ApiError::Server`]
    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.add_auth(request).send().await.map_err(|e| {
            error!("Request failed: {}", e);
            ApiError::Http(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail)
            .map(|d| match d {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.canonical_reason().unwrap_or("Unknown error").to_string()
                } else {
                    body
                }
            });

        error!("API error {}: {}", status, detail);
        Err(ApiError::Server {
            status: status.as_u16(),
            detail,
        })
    }

    async fn execute_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.execute(request).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    /// Fetch the server's audio configuration
    pub async fn get_config(&self) -> Result<serde_json::Value> {
        debug!("Fetching audio config");
        self.execute_json(self.client.get(self.url("/config"))).await
    }

    /// Update the server's audio configuration
    pub async fn update_config(&self, form: &AudioConfigForm) -> Result<serde_json::Value> {
        debug!("Updating audio config: model={}, speaker={}", form.model, form.speaker);
        self.execute_json(self.client.post(self.url("/config/update")).json(form))
            .await
    }

    /// Transcribe a complete audio file
    pub async fn transcribe(
        &self,
        audio_data: &[u8],
        filename: &str,
        language: Option<&str>,
    ) -> Result<Transcription> {
        info!("Transcribing audio: {} bytes, filename: {}", audio_data.len(), filename);

        let mut form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(audio_data.to_vec()).file_name(filename.to_string()),
        );

        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        let request = self
            .client
            .post(self.url("/transcriptions"))
            .header("Accept", "application/json")
            .multipart(form);

        let result: Transcription = self.execute_json(request).await?;
        info!("Transcription complete: {} characters", result.text.len());

        Ok(result)
    }

    /// Synthesize speech; the response body is the encoded audio
    pub async fn synthesize_speech(&self, request: &SpeechRequest) -> Result<SynthesizedSpeech> {
        info!("Synthesizing speech: {} chars, voice: {}", request.input.len(), request.voice);

        let response = self
            .execute(self.client.post(self.url("/speech")).json(request))
            .await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();

        let audio_data = response.bytes().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to read audio data: {}", e))
        })?;

        info!(
            "Synthesis complete: {} bytes, content-type: {}",
            audio_data.len(),
            content_type
        );

        Ok(SynthesizedSpeech {
            audio_data: audio_data.to_vec(),
            content_type,
        })
    }

    /// List available models
    pub async fn models(&self) -> Result<ModelsResponse> {
        self.execute_json(self.client.get(self.url("/models"))).await
    }

    /// List available voices
    pub async fn voices(&self) -> Result<VoicesResponse> {
        self.execute_json(self.client.get(self.url("/voices"))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PREFIX: &str = "/api/v1/audio";

    async fn client_for(server: &MockServer) -> AudioApiClient {
        AudioApiClient::new(format!("{}{}/", server.uri(), PREFIX), Some("test-token")).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = AudioApiClient::new("http://localhost:8080/api/v1/audio/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api/v1/audio");
        assert_eq!(client.url("/config"), "http://localhost:8080/api/v1/audio/config");
    }

    #[test]
    fn test_from_config() {
        let config = ApiConfig {
            base_url: "https://audio.example.com".to_string(),
            token: Some("abc".to_string()),
        };
        let client = AudioApiClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "https://audio.example.com");
        assert_eq!(client.token.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_get_config_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/config", PREFIX)))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tts": {"engine": "openai"},
                "stt": {"engine": ""}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = client_for(&server).await.get_config().await.unwrap();
        assert_eq!(config["tts"]["engine"], "openai");
    }

    #[tokio::test]
    async fn test_update_config_posts_form() {
        let server = MockServer::start().await;
        let form = AudioConfigForm {
            url: "https://api.openai.com/v1".to_string(),
            key: "sk-test".to_string(),
            model: "tts-1".to_string(),
            speaker: "alloy".to_string(),
        };

        Mock::given(method("POST"))
            .and(path(format!("{}/config/update", PREFIX)))
            .and(body_json(&form))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).await.update_config(&form).await.unwrap();
        assert_eq!(result["status"], true);
    }

    #[tokio::test]
    async fn test_transcribe_sends_multipart_with_language() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/transcriptions", PREFIX)))
            .and(body_string_contains("name=\"language\""))
            .and(body_string_contains("nl-NL"))
            .and(body_string_contains("filename=\"clip.wav\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "hallo wereld"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server)
            .await
            .transcribe(b"RIFF....WAVE", "clip.wav", Some("nl-NL"))
            .await
            .unwrap();
        assert_eq!(result.text, "hallo wereld");
    }

    #[tokio::test]
    async fn test_synthesize_speech_returns_binary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/speech", PREFIX)))
            .and(body_json(json!({"input": "Hallo", "voice": "alloy"})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"ID3audio".to_vec(), "audio/mpeg"))
            .expect(1)
            .mount(&server)
            .await;

        let speech = client_for(&server)
            .await
            .synthesize_speech(&SpeechRequest::new("Hallo"))
            .await
            .unwrap();
        assert_eq!(speech.audio_data, b"ID3audio");
        assert_eq!(speech.content_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn test_models_and_voices() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/models", PREFIX)))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"models": [{"id": "tts-1"}]})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{}/voices", PREFIX)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "voices": [{"id": "alloy", "name": "Alloy"}, {"id": "nova", "name": "Nova"}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let models = client.models().await.unwrap();
        assert_eq!(models.models[0].id, "tts-1");

        let voices = client.voices().await.unwrap();
        assert_eq!(voices.voices.len(), 2);
        assert_eq!(voices.voices[1].name.as_deref(), Some("Nova"));
    }

    #[tokio::test]
    async fn test_server_detail_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/config", PREFIX)))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Not authenticated"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).await.get_config().await.unwrap_err();
        match &err {
            ApiError::Server { status, detail } => {
                assert_eq!(*status, 401);
                assert_eq!(detail, "Not authenticated");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.detail(), Some("Not authenticated"));
    }

    #[tokio::test]
    async fn test_non_json_error_body_falls_back_to_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/speech", PREFIX)))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .synthesize_speech(&SpeechRequest::new("x"))
            .await
            .unwrap_err();
        assert_eq!(err.detail(), Some("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_structured_detail_is_stringified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/voices", PREFIX)))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "detail": [{"loc": ["body"], "msg": "field required"}]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).await.voices().await.unwrap_err();
        assert!(err.detail().unwrap().contains("field required"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_http_error() {
        let client = AudioApiClient::new("http://127.0.0.1:1", None).unwrap();
        let err = client.models().await.unwrap_err();
        assert!(matches!(err, ApiError::Http(_)));
    }
}
