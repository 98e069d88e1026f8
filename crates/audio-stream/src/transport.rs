//! Message-oriented transport for the transcription stream
//!
//! The session only needs a sink of outbound frames and a stream of
//! inbound ones. [`WebSocketTransport`] provides them over
//! tokio-tungstenite; tests plug in an in-memory implementation.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt, future};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, StreamError};

/// Path of the streaming endpoint below the audio API base URL
pub const STREAM_PATH: &str = "/transcriptions/stream";

/// A single frame on the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireFrame {
    Text(String),
    Binary(Vec<u8>),
}

/// Outbound half of an open transport
pub type FrameSink = Pin<Box<dyn Sink<WireFrame, Error = StreamError> + Send>>;

/// Inbound half of an open transport; ends when the peer closes
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<WireFrame>> + Send>>;

/// Opens bidirectional frame channels to a URL
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, url: &Url) -> Result<(FrameSink, FrameStream)>;
}

/// WebSocket transport
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self, url: &Url) -> Result<(FrameSink, FrameStream)> {
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;

        info!("Connected to {}", url);

        let (write, read) = ws_stream.split();

        let sink = write
            .sink_map_err(|e| StreamError::Transport(e.to_string()))
            .with(|frame: WireFrame| {
                future::ready(Ok::<_, StreamError>(match frame {
                    WireFrame::Text(text) => WsMessage::Text(text.into()),
                    WireFrame::Binary(bytes) => WsMessage::Binary(bytes.into()),
                }))
            });

        let stream = read.filter_map(|message| {
            future::ready(match message {
                Ok(WsMessage::Text(text)) => Some(Ok(WireFrame::Text(text.to_string()))),
                Ok(WsMessage::Binary(data)) => Some(Ok(WireFrame::Binary(data.to_vec()))),
                Ok(WsMessage::Close(frame)) => {
                    debug!("Server closed connection: {:?}", frame);
                    None
                }
                // Ping/pong is answered by tungstenite itself
                Ok(_) => None,
                Err(e) => Some(Err(StreamError::Transport(e.to_string()))),
            })
        });

        Ok((Box::pin(sink), Box::pin(stream)))
    }
}

/// Derive the streaming endpoint from the audio API base URL
///
/// `http` becomes `ws`, `https` becomes `wss`, and [`STREAM_PATH`] is
/// appended to the base path.
pub fn stream_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url).map_err(|e| StreamError::InvalidUrl(format!("{}: {}", base_url, e)))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(StreamError::InvalidUrl(format!("unsupported scheme `{}`", other)));
        }
    };

    url.set_scheme(scheme)
        .map_err(|_| StreamError::InvalidUrl(format!("cannot use scheme `{}`", scheme)))?;

    let path = format!("{}{}", url.path().trim_end_matches('/'), STREAM_PATH);
    url.set_path(&path);

    Ok(url)
}
