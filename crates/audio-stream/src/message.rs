//! Wire codec for the transcription stream
//!
//! Control frames travel as JSON text with a `type` tag; audio travels as
//! binary frames and is passed through untouched.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreamError};
use crate::transport::WireFrame;

/// Control frames exchanged with the server
///
/// `Init` and `Stop` are sent by the client; `Ready`, `Partial`, `Final`
/// and `Error` are sent by the server. Any other inbound `type` decodes to
/// `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlFrame {
    /// Handshake parameters, first frame on the wire
    Init {
        api_key: String,
        region: String,
        language: String,
    },

    /// Server accepted the session
    Ready,

    /// Interim transcript
    Partial {
        #[serde(default, deserialize_with = "lenient_string")]
        text: String,
    },

    /// Finalized transcript segment
    Final {
        #[serde(default, deserialize_with = "lenient_string")]
        text: String,
    },

    /// Server-reported failure; `message` may be empty
    Error {
        #[serde(default, deserialize_with = "lenient_string")]
        message: String,
    },

    /// Client is ending the session
    Stop,

    /// Inbound frame with a type this client does not know
    #[serde(skip)]
    Unknown { kind: String },
}

/// Accept a missing, null or non-string payload field
///
/// Only `type` is required of an inbound frame, so a known frame with an odd
/// payload still reaches its handler.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Anything the client puts on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Control(ControlFrame),
    Audio(Vec<u8>),
}

impl OutboundFrame {
    pub fn is_audio(&self) -> bool {
        matches!(self, Self::Audio(_))
    }
}

/// Encode an outbound frame for the transport
pub fn encode(frame: OutboundFrame) -> Result<WireFrame> {
    match frame {
        OutboundFrame::Control(control) => serde_json::to_string(&control)
            .map(WireFrame::Text)
            .map_err(|e| StreamError::Encode(e.to_string())),
        OutboundFrame::Audio(bytes) => Ok(WireFrame::Binary(bytes)),
    }
}

/// Decode an inbound frame into a [`ControlFrame`]
///
/// The payload must be a JSON object with a string `type` field. Payload
/// fields of known types are optional and default to an empty string.
pub fn decode(frame: &WireFrame) -> Result<ControlFrame> {
    let value: serde_json::Value = match frame {
        WireFrame::Text(text) => serde_json::from_str(text),
        WireFrame::Binary(bytes) => serde_json::from_slice(bytes),
    }
    .map_err(|e| StreamError::Decode(e.to_string()))?;

    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .map(str::to_owned)
        .ok_or_else(|| StreamError::Decode("missing `type` field".to_string()))?;

    match kind.as_str() {
        "init" | "ready" | "partial" | "final" | "error" | "stop" => {
            serde_json::from_value(value).map_err(|e| StreamError::Decode(e.to_string()))
        }
        _ => Ok(ControlFrame::Unknown { kind }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_json(frame: WireFrame) -> serde_json::Value {
        match frame {
            WireFrame::Text(text) => serde_json::from_str(&text).unwrap(),
            WireFrame::Binary(_) => panic!("expected a text frame"),
        }
    }

    #[test]
    fn test_encode_init() {
        let frame = encode(OutboundFrame::Control(ControlFrame::Init {
            api_key: "key".to_string(),
            region: "swedencentral".to_string(),
            language: "nl-NL".to_string(),
        }))
        .unwrap();

        assert_eq!(
            text_json(frame),
            json!({"type": "init", "api_key": "key", "region": "swedencentral", "language": "nl-NL"})
        );
    }

    #[test]
    fn test_encode_stop() {
        let frame = encode(OutboundFrame::Control(ControlFrame::Stop)).unwrap();
        assert_eq!(frame, WireFrame::Text(r#"{"type":"stop"}"#.to_string()));
    }

    #[test]
    fn test_encode_audio_is_passthrough() {
        let bytes = vec![0u8, 1, 2, 255, 254];
        let frame = encode(OutboundFrame::Audio(bytes.clone())).unwrap();
        assert_eq!(frame, WireFrame::Binary(bytes));
    }

    #[test]
    fn test_encode_unknown_fails() {
        let result = encode(OutboundFrame::Control(ControlFrame::Unknown {
            kind: "x".to_string(),
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_server_frames() {
        let cases = [
            (r#"{"type":"ready"}"#, ControlFrame::Ready),
            (
                r#"{"type":"partial","text":"hallo"}"#,
                ControlFrame::Partial { text: "hallo".to_string() },
            ),
            (
                r#"{"type":"final","text":"hallo wereld","offset":120}"#,
                ControlFrame::Final { text: "hallo wereld".to_string() },
            ),
            (
                r#"{"type":"error","message":"bad key"}"#,
                ControlFrame::Error { message: "bad key".to_string() },
            ),
        ];

        for (json, expected) in cases {
            let decoded = decode(&WireFrame::Text(json.to_string())).unwrap();
            assert_eq!(decoded, expected, "decoding {}", json);
        }
    }

    #[test]
    fn test_decode_unknown_type() {
        let decoded = decode(&WireFrame::Text(r#"{"type":"speech_start"}"#.to_string())).unwrap();
        assert_eq!(decoded, ControlFrame::Unknown { kind: "speech_start".to_string() });
    }

    #[test]
    fn test_decode_binary_json() {
        let decoded = decode(&WireFrame::Binary(br#"{"type":"ready"}"#.to_vec())).unwrap();
        assert_eq!(decoded, ControlFrame::Ready);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            decode(&WireFrame::Text("not json".to_string())),
            Err(StreamError::Decode(_))
        ));
        assert!(matches!(
            decode(&WireFrame::Binary(vec![0xde, 0xad])),
            Err(StreamError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_missing_type() {
        let result = decode(&WireFrame::Text(r#"{"text":"hallo"}"#.to_string()));
        assert!(matches!(result, Err(StreamError::Decode(_))));

        let result = decode(&WireFrame::Text(r#"{"type":42}"#.to_string()));
        assert!(matches!(result, Err(StreamError::Decode(_))));
    }

    #[test]
    fn test_decode_known_type_missing_field() {
        let cases = [
            (r#"{"type":"partial"}"#, ControlFrame::Partial { text: String::new() }),
            (r#"{"type":"final","text":null}"#, ControlFrame::Final { text: String::new() }),
            (r#"{"type":"error"}"#, ControlFrame::Error { message: String::new() }),
            (
                r#"{"type":"error","message":null}"#,
                ControlFrame::Error { message: String::new() },
            ),
            (r#"{"type":"error","message":503}"#, ControlFrame::Error { message: "503".to_string() }),
        ];

        for (json, expected) in cases {
            let decoded = decode(&WireFrame::Text(json.to_string())).unwrap();
            assert_eq!(decoded, expected, "decoding {}", json);
        }
    }
}
