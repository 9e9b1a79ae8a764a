//! Wire frames exchanged through the room relay.
//!
//! Each frame is one JSON object tagged by `type`:
//! ```json
//! { "type": "stroke", "userId": "u1", "color": "#000000", "width": 2, "points": [{ "x": 0, "y": 0 }] }
//! { "type": "undo", "userId": "u1" }
//! { "type": "chat", "chatType": "CONNECTION", "userId": "u1", "message": "u1 joined" }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::chat::ChatEntry;
use crate::stroke::Stroke;

/// Errors raised while encoding or decoding a frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("frame has no `type` field")]
    MissingType,
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// A frame understood by this client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// A finished stroke to append.
    Stroke(Stroke),
    /// Remove the author's tail-most stroke.
    Undo {
        #[serde(rename = "userId")]
        user_id: String,
    },
    /// Chat entry or connection notice.
    Chat(ChatEntry),
}

impl Frame {
    pub fn undo(user_id: impl Into<String>) -> Self {
        Self::Undo {
            user_id: user_id.into(),
        }
    }

    /// The `type` tag of this frame.
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Stroke(_) => "stroke",
            Frame::Undo { .. } => "undo",
            Frame::Chat(_) => "chat",
        }
    }

    /// Serialize to a text frame.
    pub fn encode(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Outcome of decoding an inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Frame(Frame),
    /// Well-formed JSON with a `type` this client does not handle.
    Unknown(String),
}

const KNOWN_KINDS: [&str; 3] = ["stroke", "undo", "chat"];

/// Decode one inbound text frame.
///
/// Unrecognized `type` values are reported as [`Inbound::Unknown`] rather
/// than as errors; anything that is not a JSON object with a string `type`,
/// or a known frame with invalid fields, is a [`ProtocolError`].
pub fn decode(raw: &str) -> ProtocolResult<Inbound> {
    let value: Value = serde_json::from_str(raw)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?
        .to_string();

    if KNOWN_KINDS.contains(&kind.as_str()) {
        Ok(Inbound::Frame(serde_json::from_value(value)?))
    } else {
        Ok(Inbound::Unknown(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatKind;
    use crate::stroke::StrokeColor;
    use kurbo::Point;

    #[test]
    fn test_decode_stroke() {
        let raw = r##"{"type":"stroke","userId":"u1","color":"#000000","width":2,"points":[{"x":0,"y":0},{"x":5,"y":5}]}"##;
        let Inbound::Frame(Frame::Stroke(stroke)) = decode(raw).unwrap() else {
            panic!("expected a stroke frame");
        };
        assert_eq!(stroke.author_id(), "u1");
        assert_eq!(stroke.color(), StrokeColor::black());
        assert_eq!(stroke.points(), &[Point::new(0.0, 0.0), Point::new(5.0, 5.0)]);
    }

    #[test]
    fn test_decode_undo() {
        let frame = decode(r#"{"type":"undo","userId":"u1"}"#).unwrap();
        assert_eq!(frame, Inbound::Frame(Frame::undo("u1")));
    }

    #[test]
    fn test_decode_chat() {
        let raw = r#"{"type":"chat","chatType":"CONNECTION","userId":"u1","message":"u1 joined"}"#;
        let Inbound::Frame(Frame::Chat(entry)) = decode(raw).unwrap() else {
            panic!("expected a chat frame");
        };
        assert_eq!(entry.kind, ChatKind::Connection);
        assert_eq!(entry.text, "u1 joined");
    }

    #[test]
    fn test_unknown_kind_is_not_an_error() {
        let frame = decode(r#"{"type":"cursor","x":1}"#).unwrap();
        assert_eq!(frame, Inbound::Unknown("cursor".to_string()));
    }

    #[test]
    fn test_malformed_frames() {
        assert!(matches!(decode("not json"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(decode(r#"{"userId":"u1"}"#), Err(ProtocolError::MissingType)));
        assert!(matches!(decode(r#"{"type":7}"#), Err(ProtocolError::MissingType)));
        assert!(matches!(decode(r#"{"type":"undo"}"#), Err(ProtocolError::Malformed(_))));
        assert!(decode(r##"{"type":"stroke","userId":"u1","color":"#000","width":2,"points":[]}"##).is_err());
        assert!(decode(r#"{"type":"stroke","userId":"u1","color":"blue","width":2,"points":[{"x":0,"y":0}]}"#).is_err());
    }

    #[test]
    fn test_encode_tags_frames() {
        let json = Frame::undo("u1").encode().unwrap();
        assert_eq!(json, r#"{"type":"undo","userId":"u1"}"#);

        let chat = Frame::Chat(ChatEntry::message("u1", "hi").unwrap()).encode().unwrap();
        let value: Value = serde_json::from_str(&chat).unwrap();
        assert_eq!(value["type"], "chat");
        assert_eq!(value["chatType"], "CHAT");
    }

    #[test]
    fn test_encoded_stroke_decodes() {
        let stroke = Stroke::new(
            "u2",
            StrokeColor::rgb(0x4c, 0xaf, 0x50),
            3.0,
            vec![Point::new(1.5, 2.5)],
        )
        .unwrap();
        let raw = Frame::Stroke(stroke.clone()).encode().unwrap();
        assert_eq!(decode(&raw).unwrap(), Inbound::Frame(Frame::Stroke(stroke)));
    }
}
