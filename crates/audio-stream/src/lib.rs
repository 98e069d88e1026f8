//! audio-stream: real-time transcription over a WebSocket
//!
//! A [`RealtimeTranscriptionStream`] opens the streaming endpoint, sends an
//! `init` frame with the speech credentials, waits for the server's `ready`
//! frame and then accepts binary audio. Partial and final transcripts are
//! delivered through [`StreamCallbacks`].
//!
//! ```rust,ignore
//! use audio_stream::{HandshakeParameters, RealtimeTranscriptionStream, StreamCallbacks};
//!
//! #[tokio::main]
//! async fn main() -> audio_stream::Result<()> {
//!     let params = HandshakeParameters::new("speech-key", "swedencentral", "nl-NL")?;
//!     let callbacks = StreamCallbacks::new()
//!         .on_partial(|text| println!("... {}", text))
//!         .on_final(|text| println!(">>> {}", text))
//!         .on_error(|message| eprintln!("error: {}", message));
//!
//!     let stream = RealtimeTranscriptionStream::new("http://localhost:8080/api/v1/audio", params, callbacks);
//!     stream.connect().await?;
//!     stream.send_audio(vec![0u8; 3200]);
//!     stream.stop();
//!     Ok(())
//! }
//! ```

pub mod callbacks;
pub mod error;
pub mod handler;
pub mod message;
pub mod session;
pub mod stream;
pub mod transport;

pub use callbacks::{StreamCallbacks, TranscriptEvent};
pub use error::{Result, StreamError};
pub use message::{ControlFrame, OutboundFrame};
pub use session::{HandshakeParameters, Readiness, StreamSession};
pub use stream::RealtimeTranscriptionStream;
pub use transport::{stream_url, FrameSink, FrameStream, Transport, WebSocketTransport, WireFrame};
