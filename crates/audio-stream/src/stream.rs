//! Public handle for a real-time transcription stream

use std::sync::Arc;

use audio_core::AudioConfig;

use crate::callbacks::StreamCallbacks;
use crate::error::{Result, StreamError};
use crate::message::OutboundFrame;
use crate::session::{HandshakeParameters, Readiness, StreamSession};
use crate::transport::{stream_url, Transport, WebSocketTransport};

/// Real-time transcription stream
///
/// Wraps a single-use [`StreamSession`]. After [`stop`](Self::stop) or a
/// fault, build a new stream to reconnect.
pub struct RealtimeTranscriptionStream {
    base_url: String,
    params: HandshakeParameters,
    transport: Arc<dyn Transport>,
    session: StreamSession,
}

impl RealtimeTranscriptionStream {
    /// Create a stream for the audio API at `base_url`
    ///
    /// Nothing is opened until [`connect`](Self::connect).
    pub fn new(
        base_url: impl Into<String>,
        params: HandshakeParameters,
        callbacks: StreamCallbacks,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            params,
            transport: Arc::new(WebSocketTransport),
            session: StreamSession::new(callbacks),
        }
    }

    /// Create a stream from loaded configuration
    pub fn from_config(config: &AudioConfig, callbacks: StreamCallbacks) -> Result<Self> {
        let params = HandshakeParameters::from_config(&config.stream)?;
        Ok(Self::new(config.api.base_url.clone(), params, callbacks))
    }

    /// Replace the WebSocket transport
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    /// Connect and wait for the server's `ready` frame
    ///
    /// Fails on a malformed URL, a transport that cannot be opened, an
    /// `error` frame or transport failure before `ready`, or a `stop` issued
    /// while waiting. Each session connects at most once.
    pub async fn connect(&self) -> Result<()> {
        let url = match stream_url(&self.base_url) {
            Ok(url) => url,
            Err(e) => {
                self.session.fault(e.clone(), e.to_string());
                return Err(e);
            }
        };

        let completion = self
            .session
            .open(self.transport.as_ref(), &url, &self.params)
            .await?;

        completion.await.unwrap_or_else(|_| {
            Err(StreamError::Handshake("session dropped before ready".to_string()))
        })
    }

    /// Send a chunk of audio
    ///
    /// Dropped with a warning unless the stream is ready.
    pub fn send_audio(&self, audio: impl Into<Vec<u8>>) {
        self.session.send(OutboundFrame::Audio(audio.into()));
    }

    /// Send `stop` and close the transport; idempotent
    pub fn stop(&self) {
        self.session.close();
    }

    /// True iff the transport is open and the handshake completed
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn readiness(&self) -> Readiness {
        self.session.readiness()
    }
}

impl Drop for RealtimeTranscriptionStream {
    fn drop(&mut self) {
        self.session.close();
    }
}
