//! Result and error callbacks registered by the caller

use std::sync::Arc;

use tokio::sync::mpsc;

type Callback = Arc<dyn Fn(String) + Send + Sync>;

/// Transcription events, for callers that prefer a channel to callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    Partial(String),
    Final(String),
    Error(String),
}

/// Callbacks invoked by the stream's dispatcher
///
/// Each callback runs on the stream's reader task, one frame at a time and
/// in wire order. Unset callbacks are no-ops.
#[derive(Clone)]
pub struct StreamCallbacks {
    on_partial: Callback,
    on_final: Callback,
    on_error: Callback,
}

impl Default for StreamCallbacks {
    fn default() -> Self {
        Self {
            on_partial: Arc::new(|_| {}),
            on_final: Arc::new(|_| {}),
            on_error: Arc::new(|_| {}),
        }
    }
}

impl std::fmt::Debug for StreamCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamCallbacks").finish_non_exhaustive()
    }
}

impl StreamCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interim transcript callback
    pub fn on_partial(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_partial = Arc::new(f);
        self
    }

    /// Set the finalized transcript callback
    pub fn on_final(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_final = Arc::new(f);
        self
    }

    /// Set the error callback
    pub fn on_error(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_error = Arc::new(f);
        self
    }

    /// Callbacks that forward every event into an unbounded channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TranscriptEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let partial_tx = tx.clone();
        let final_tx = tx.clone();

        let callbacks = Self::new()
            .on_partial(move |text| {
                let _ = partial_tx.send(TranscriptEvent::Partial(text));
            })
            .on_final(move |text| {
                let _ = final_tx.send(TranscriptEvent::Final(text));
            })
            .on_error(move |message| {
                let _ = tx.send(TranscriptEvent::Error(message));
            });

        (callbacks, rx)
    }

    pub(crate) fn partial(&self, text: String) {
        (self.on_partial)(text)
    }

    pub(crate) fn final_result(&self, text: String) {
        (self.on_final)(text)
    }

    pub(crate) fn error(&self, message: String) {
        (self.on_error)(message)
    }
}
