//! Connection state machine for one transcription session
//!
//! A [`StreamSession`] owns the transport for its lifetime and is the only
//! writer of its [`Readiness`]. States only move forward
//! (`NotConnected -> AwaitingReady -> Ready`), and `Closed` is reachable
//! from every state. A closed session is never reopened.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use audio_core::StreamConfig;
use futures::SinkExt;
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::callbacks::StreamCallbacks;
use crate::error::{Result, StreamError};
use crate::handler;
use crate::message::{encode, ControlFrame, OutboundFrame};
use crate::transport::{FrameSink, Transport, WireFrame};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Created, transport not opened yet
    NotConnected,
    /// Transport open and `init` sent, waiting for `ready`
    AwaitingReady,
    /// Server accepted the session; audio may flow
    Ready,
    /// Stopped, failed, or closed by the peer
    Closed,
}

/// Values sent in the `init` frame
///
/// There are no built-in defaults: every value must be supplied.
#[derive(Clone, PartialEq, Eq)]
pub struct HandshakeParameters {
    api_key: String,
    region: String,
    language: String,
}

impl HandshakeParameters {
    /// Create handshake parameters; empty values are rejected
    pub fn new(
        api_key: impl Into<String>,
        region: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self> {
        let params = Self {
            api_key: api_key.into(),
            region: region.into(),
            language: language.into(),
        };

        for (name, value) in [
            ("api_key", &params.api_key),
            ("region", &params.region),
            ("language", &params.language),
        ] {
            if value.trim().is_empty() {
                return Err(StreamError::Config(format!("speech {} must not be empty", name)));
            }
        }

        Ok(params)
    }

    /// Build from the `[stream]` configuration section
    pub fn from_config(config: &StreamConfig) -> Result<Self> {
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            StreamError::Config("speech api_key is not configured (SPEECH_API_KEY)".to_string())
        })?;
        let region = config.region.as_deref().ok_or_else(|| {
            StreamError::Config("speech region is not configured (SPEECH_REGION)".to_string())
        })?;

        Self::new(api_key, region, config.language.clone())
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn init_frame(&self) -> ControlFrame {
        ControlFrame::Init {
            api_key: self.api_key.clone(),
            region: self.region.clone(),
            language: self.language.clone(),
        }
    }
}

impl std::fmt::Debug for HandshakeParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandshakeParameters")
            .field("api_key", &"<redacted>")
            .field("region", &self.region)
            .field("language", &self.language)
            .finish()
    }
}

/// Resolves once with the outcome of the handshake
pub type Completion = oneshot::Receiver<Result<()>>;

struct SessionState {
    readiness: Readiness,
    /// Queue drained by the writer task; `None` once the transport is closed
    outbound: Option<mpsc::UnboundedSender<WireFrame>>,
    /// Handshake completion, taken exactly once
    pending: Option<oneshot::Sender<Result<()>>>,
}

/// One logical connection to the streaming endpoint
#[derive(Clone)]
pub struct StreamSession {
    id: String,
    state: Arc<Mutex<SessionState>>,
    shutdown: Arc<Notify>,
    callbacks: StreamCallbacks,
}

impl StreamSession {
    /// Create a session with no transport yet
    pub fn new(callbacks: StreamCallbacks) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            state: Arc::new(Mutex::new(SessionState {
                readiness: Readiness::NotConnected,
                outbound: None,
                pending: None,
            })),
            shutdown: Arc::new(Notify::new()),
            callbacks,
        }
    }

    /// Unique session ID used in log lines
    pub fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn readiness(&self) -> Readiness {
        self.state().readiness
    }

    /// True iff the transport is open and the handshake completed
    pub fn is_connected(&self) -> bool {
        let state = self.state();
        state.readiness == Readiness::Ready
            && state.outbound.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub(crate) fn callbacks(&self) -> &StreamCallbacks {
        &self.callbacks
    }

    pub(crate) fn shutdown_signal(&self) -> &Notify {
        &self.shutdown
    }

    /// Open the transport and send `init` before anything else
    ///
    /// Returns the handshake completion. Fails immediately if the session
    /// was already started or the transport cannot be opened.
    pub async fn open(
        &self,
        transport: &dyn Transport,
        url: &Url,
        params: &HandshakeParameters,
    ) -> Result<Completion> {
        let init = encode(OutboundFrame::Control(params.init_frame()))?;

        {
            let mut state = self.state();
            if state.readiness != Readiness::NotConnected {
                warn!(
                    "[Session {}] connect called in state {:?}",
                    self.id, state.readiness
                );
                return Err(StreamError::AlreadyStarted);
            }
            state.readiness = Readiness::AwaitingReady;
        }

        debug!("[Session {}] Opening {}", self.id, url);

        let (sink, frames) = match transport.open(url).await {
            Ok(halves) => halves,
            Err(e) => {
                error!("[Session {}] Failed to open transport: {}", self.id, e);
                self.fault(e.clone(), e.to_string());
                return Err(e);
            }
        };

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (pending_tx, pending_rx) = oneshot::channel();

        {
            let mut state = self.state();
            if state.readiness != Readiness::AwaitingReady {
                info!("[Session {}] Stopped while connecting", self.id);
                // Nothing queued: the writer closes the sink straight away
                drop(outbound_tx);
                tokio::spawn(write_frames(self.id.clone(), outbound_rx, sink));
                return Err(StreamError::Closed);
            }

            // The queue is FIFO, so `init` is the first frame on the wire
            outbound_tx
                .send(init)
                .map_err(|_| StreamError::Transport("writer unavailable".to_string()))?;
            state.outbound = Some(outbound_tx);
            state.pending = Some(pending_tx);
        }

        info!(
            "[Session {}] Real-time transcription connected (region: {}, language: {})",
            self.id, params.region, params.language
        );

        tokio::spawn(write_frames(self.id.clone(), outbound_rx, sink));
        tokio::spawn(handler::run(self.clone(), frames));

        Ok(pending_rx)
    }

    /// Handshake completed; only effective while `AwaitingReady`
    pub(crate) fn mark_ready(&self) {
        let pending = {
            let mut state = self.state();
            if state.readiness != Readiness::AwaitingReady {
                debug!(
                    "[Session {}] Ignoring ready frame in state {:?}",
                    self.id, state.readiness
                );
                return;
            }
            state.readiness = Readiness::Ready;
            state.pending.take()
        };

        info!("[Session {}] Real-time transcription ready", self.id);

        if let Some(tx) = pending {
            let _ = tx.send(Ok(()));
        }
    }

    /// Server-reported failure
    pub(crate) fn fail(&self, message: String) {
        self.fault(StreamError::Handshake(message.clone()), message);
    }

    /// Read error on the transport
    pub(crate) fn transport_failed(&self, err: StreamError) {
        let message = format!("WebSocket connection error: {}", err);
        self.fault(err, message);
    }

    /// Close the session after a fault and report it
    ///
    /// Rejects the pending handshake if there is one. The transport is
    /// closed without a `stop` frame.
    pub(crate) fn fault(&self, err: StreamError, message: String) {
        let (previous, pending) = {
            let mut state = self.state();
            let previous = state.readiness;
            if previous == Readiness::Closed {
                debug!("[Session {}] Fault after close ignored: {}", self.id, message);
                return;
            }
            state.readiness = Readiness::Closed;
            state.outbound = None;
            (previous, state.pending.take())
        };

        self.shutdown.notify_one();

        if previous == Readiness::Ready {
            warn!("[Session {}] Session faulted after ready, closing", self.id);
        }

        self.callbacks.error(message);

        if let Some(tx) = pending {
            let _ = tx.send(Err(err));
        }
    }

    /// Peer closed the transport
    pub(crate) fn transport_closed(&self) {
        let pending = {
            let mut state = self.state();
            if state.readiness == Readiness::Closed {
                return;
            }
            state.readiness = Readiness::Closed;
            state.outbound = None;
            state.pending.take()
        };

        info!("[Session {}] Real-time transcription WebSocket closed", self.id);

        if let Some(tx) = pending {
            let _ = tx.send(Err(StreamError::Handshake(
                "connection closed before ready".to_string(),
            )));
        }
    }

    /// Queue a frame for the transport
    ///
    /// Audio is only accepted once the session is `Ready`. Rejected frames
    /// are dropped with a warning and `false` is returned.
    pub fn send(&self, frame: OutboundFrame) -> bool {
        let state = self.state();

        let Some(tx) = state.outbound.as_ref() else {
            warn!("[Session {}] WebSocket not open, dropping frame", self.id);
            return false;
        };

        if frame.is_audio() && state.readiness != Readiness::Ready {
            warn!("[Session {}] WebSocket not ready, cannot send audio", self.id);
            return false;
        }

        let wire = match encode(frame) {
            Ok(wire) => wire,
            Err(e) => {
                warn!("[Session {}] {}", self.id, e);
                return false;
            }
        };

        if tx.send(wire).is_err() {
            warn!("[Session {}] Transport writer has stopped, dropping frame", self.id);
            return false;
        }

        true
    }

    /// Send `stop` if the transport is open, then close it
    ///
    /// Safe to call any number of times. A handshake still pending is
    /// rejected with [`StreamError::Closed`].
    pub fn close(&self) {
        let (outbound, pending) = {
            let mut state = self.state();
            state.readiness = Readiness::Closed;
            (state.outbound.take(), state.pending.take())
        };

        self.shutdown.notify_one();

        if let Some(tx) = outbound {
            info!("[Session {}] Stopping real-time transcription", self.id);
            match encode(OutboundFrame::Control(ControlFrame::Stop)) {
                Ok(stop) => {
                    if tx.send(stop).is_err() {
                        debug!("[Session {}] Transport already gone", self.id);
                    }
                }
                Err(e) => warn!("[Session {}] {}", self.id, e),
            }
            // Dropping the sender lets the writer flush `stop` and close
        }

        if let Some(tx) = pending {
            let _ = tx.send(Err(StreamError::Closed));
        }
    }
}

/// Drain the outbound queue into the transport, then close it
async fn write_frames(
    session_id: String,
    mut outbound: mpsc::UnboundedReceiver<WireFrame>,
    mut sink: FrameSink,
) {
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = sink.send(frame).await {
            warn!("[Session {}] Failed to send frame: {}", session_id, e);
            break;
        }
    }

    if let Err(e) = sink.close().await {
        debug!("[Session {}] Error closing transport: {}", session_id, e);
    }

    debug!("[Session {}] Writer task ended", session_id);
}
