//! The tagged wire protocol shared with remote clients.
//!
//! Every frame is one tag byte followed by an opaque payload; boundaries
//! come from the transport's frames. The tag values are deployed protocol
//! constants and must not change.

use serde::Deserialize;

use crate::error::BridgeError;

/// Tags on frames sent to the master.
pub mod outgoing {
    /// Raw terminal output.
    pub const OUTPUT: u8 = b'1';
    /// Keepalive reply to `Ping`.
    pub const PONG: u8 = b'2';
    /// Directory snapshot, sent once at session start.
    pub const LIST_OF_FILE: u8 = b'6';
}

/// Tags on frames received from the master.
///
/// Kept as a closed enum with a distinct `Unrecognized` variant so the
/// ignore-vs-fail policy for unknown tags stays explicit, separate from
/// payload decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientTag {
    /// Keystrokes for the terminal.
    Input,
    /// Keepalive request; answered with a `Pong` frame.
    Ping,
    /// Terminal geometry change, JSON `{columns, rows}` payload.
    ResizeTerminal,
    /// File write, JSON `{path, content}` payload.
    WriteFile,
    /// File or directory removal, raw path payload.
    RemoveFile,
    /// Any other tag byte.
    Unrecognized(u8),
}

impl ClientTag {
    /// Map a received tag byte to its variant. Total: unknown bytes land
    /// in `Unrecognized` rather than an error.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'1' => ClientTag::Input,
            b'2' => ClientTag::Ping,
            b'3' => ClientTag::ResizeTerminal,
            b'4' => ClientTag::WriteFile,
            b'5' => ClientTag::RemoveFile,
            other => ClientTag::Unrecognized(other),
        }
    }
}

/// Payload of a `ResizeTerminal` frame.
///
/// Geometry arrives as JSON numbers; clients send whatever JavaScript
/// serializes, so floats are accepted and truncated.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResizeRequest {
    pub columns: f64,
    pub rows: f64,
}

impl ResizeRequest {
    pub fn decode(payload: &[u8]) -> Result<Self, BridgeError> {
        serde_json::from_slice(payload).map_err(|source| BridgeError::MalformedPayload {
            what: "terminal resize",
            source,
        })
    }
}

/// Payload of a `WriteFile` frame. `content` travels as a base64 string,
/// the JSON encoding of raw bytes used by deployed clients.
#[derive(Debug, Clone, Deserialize)]
pub struct WriteRequest {
    pub path: String,
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
}

impl WriteRequest {
    pub fn decode(payload: &[u8]) -> Result<Self, BridgeError> {
        serde_json::from_slice(payload).map_err(|source| BridgeError::MalformedPayload {
            what: "file write",
            source,
        })
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}

/// Assemble one wire frame from a tag byte and payload.
pub fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + payload.len());
    buf.push(tag);
    buf.extend_from_slice(payload);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_bytes_map_to_variants() {
        assert_eq!(ClientTag::from_byte(b'1'), ClientTag::Input);
        assert_eq!(ClientTag::from_byte(b'2'), ClientTag::Ping);
        assert_eq!(ClientTag::from_byte(b'3'), ClientTag::ResizeTerminal);
        assert_eq!(ClientTag::from_byte(b'4'), ClientTag::WriteFile);
        assert_eq!(ClientTag::from_byte(b'5'), ClientTag::RemoveFile);
        assert_eq!(ClientTag::from_byte(0xFF), ClientTag::Unrecognized(0xFF));
        assert_eq!(ClientTag::from_byte(b'9'), ClientTag::Unrecognized(b'9'));
    }

    #[test]
    fn resize_accepts_integers_and_floats() {
        let request = ResizeRequest::decode(br#"{"columns":80,"rows":24}"#).unwrap();
        assert_eq!(request.columns as u16, 80);
        assert_eq!(request.rows as u16, 24);

        let request = ResizeRequest::decode(br#"{"columns":132.0,"rows":43.5}"#).unwrap();
        assert_eq!(request.columns as u16, 132);
        assert_eq!(request.rows as u16, 43);
    }

    #[test]
    fn resize_rejects_garbage() {
        assert!(matches!(
            ResizeRequest::decode(b"not json"),
            Err(BridgeError::MalformedPayload { what: "terminal resize", .. })
        ));
    }

    #[test]
    fn write_request_decodes_base64_content() {
        let request =
            WriteRequest::decode(br#"{"path":"/tmp/x","content":"AQID"}"#).unwrap();
        assert_eq!(request.path, "/tmp/x");
        assert_eq!(request.content, vec![1, 2, 3]);
    }

    #[test]
    fn write_request_rejects_bad_base64() {
        assert!(matches!(
            WriteRequest::decode(br#"{"path":"/tmp/x","content":"!!!"}"#),
            Err(BridgeError::MalformedPayload { what: "file write", .. })
        ));
    }

    #[test]
    fn frame_prepends_the_tag() {
        assert_eq!(frame(outgoing::OUTPUT, b"hi"), vec![b'1', b'h', b'i']);
        assert_eq!(frame(outgoing::PONG, &[]), vec![b'2']);
    }
}
