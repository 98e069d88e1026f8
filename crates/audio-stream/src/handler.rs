//! Inbound frame dispatcher
//!
//! Runs as the session's single reader task: frames are decoded and routed
//! strictly in the order the transport delivers them.

use futures::StreamExt;
use tracing::{debug, error, info};

use crate::message::{decode, ControlFrame};
use crate::session::{Readiness, StreamSession};
use crate::transport::{FrameStream, WireFrame};

/// Reported to the error callback when a frame cannot be decoded
pub const PARSE_ERROR_MESSAGE: &str = "Failed to parse server message";

/// Reported when an `error` frame carries no message
pub const DEFAULT_ERROR_MESSAGE: &str = "Transcription error";

/// Read frames until the peer closes, the transport fails, or the session
/// is closed
pub(crate) async fn run(session: StreamSession, mut frames: FrameStream) {
    loop {
        let next = tokio::select! {
            biased;
            _ = session.shutdown_signal().notified() => break,
            next = frames.next() => next,
        };

        match next {
            Some(Ok(frame)) => dispatch(&session, &frame),
            Some(Err(e)) => {
                error!("[Session {}] WebSocket error: {}", session.id(), e);
                session.transport_failed(e);
                break;
            }
            None => {
                session.transport_closed();
                break;
            }
        }

        if session.readiness() == Readiness::Closed {
            break;
        }
    }

    debug!("[Session {}] Reader task ended", session.id());
}

/// Route one inbound frame; at most one callback fires per frame
pub(crate) fn dispatch(session: &StreamSession, frame: &WireFrame) {
    let message = match decode(frame) {
        Ok(message) => message,
        Err(e) => {
            error!("[Session {}] Error parsing WebSocket message: {}", session.id(), e);
            session.callbacks().error(PARSE_ERROR_MESSAGE.to_string());
            return;
        }
    };

    match message {
        ControlFrame::Ready => session.mark_ready(),
        ControlFrame::Partial { text } => {
            debug!("[Session {}] Partial transcription: {}", session.id(), text);
            session.callbacks().partial(text);
        }
        ControlFrame::Final { text } => {
            info!("[Session {}] Final transcription: {}", session.id(), text);
            session.callbacks().final_result(text);
        }
        ControlFrame::Error { message } => {
            let message = if message.is_empty() {
                DEFAULT_ERROR_MESSAGE.to_string()
            } else {
                message
            };
            error!("[Session {}] Transcription error: {}", session.id(), message);
            session.fail(message);
        }
        ControlFrame::Init { .. } | ControlFrame::Stop => {
            debug!("[Session {}] Ignoring client-only frame from server", session.id());
        }
        ControlFrame::Unknown { kind } => {
            debug!("[Session {}] Unknown message type: {}", session.id(), kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::{StreamCallbacks, TranscriptEvent};

    fn text(json: &str) -> WireFrame {
        WireFrame::Text(json.to_string())
    }

    #[tokio::test]
    async fn test_dispatch_results_in_order() {
        let (callbacks, mut events) = StreamCallbacks::channel();
        let session = StreamSession::new(callbacks);

        dispatch(&session, &text(r#"{"type":"partial","text":"goede"}"#));
        dispatch(&session, &text(r#"{"type":"partial","text":"goedemor"}"#));
        dispatch(&session, &text(r#"{"type":"final","text":"goedemorgen"}"#));

        assert_eq!(events.recv().await, Some(TranscriptEvent::Partial("goede".to_string())));
        assert_eq!(events.recv().await, Some(TranscriptEvent::Partial("goedemor".to_string())));
        assert_eq!(events.recv().await, Some(TranscriptEvent::Final("goedemorgen".to_string())));
    }

    #[tokio::test]
    async fn test_dispatch_malformed_reports_once() {
        let (callbacks, mut events) = StreamCallbacks::channel();
        let session = StreamSession::new(callbacks);

        dispatch(&session, &text("{not json"));

        assert_eq!(
            events.recv().await,
            Some(TranscriptEvent::Error(PARSE_ERROR_MESSAGE.to_string()))
        );
        assert!(events.try_recv().is_err());
        assert_eq!(session.readiness(), Readiness::NotConnected);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_and_client_frames_are_ignored() {
        let (callbacks, mut events) = StreamCallbacks::channel();
        let session = StreamSession::new(callbacks);

        dispatch(&session, &text(r#"{"type":"speech_start","offset":10}"#));
        dispatch(&session, &text(r#"{"type":"stop"}"#));

        assert!(events.try_recv().is_err());
        assert_eq!(session.readiness(), Readiness::NotConnected);
    }

    #[tokio::test]
    async fn test_dispatch_error_closes_session() {
        let (callbacks, mut events) = StreamCallbacks::channel();
        let session = StreamSession::new(callbacks);

        dispatch(&session, &text(r#"{"type":"error","message":"quota exceeded"}"#));

        assert_eq!(events.recv().await, Some(TranscriptEvent::Error("quota exceeded".to_string())));
        assert_eq!(session.readiness(), Readiness::Closed);
    }

    #[tokio::test]
    async fn test_dispatch_error_without_message() {
        let (callbacks, mut events) = StreamCallbacks::channel();
        let session = StreamSession::new(callbacks);

        dispatch(&session, &text(r#"{"type":"error","message":null}"#));

        assert_eq!(
            events.recv().await,
            Some(TranscriptEvent::Error(DEFAULT_ERROR_MESSAGE.to_string()))
        );
        assert_eq!(session.readiness(), Readiness::Closed);
    }
}
