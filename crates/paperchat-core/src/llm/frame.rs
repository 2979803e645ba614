//! Decoding of individual server-sent event frames.
//!
//! A frame is either an SSE data frame carrying a chat-completion delta, the
//! `[DONE]` sentinel, or (on some failure paths) a bare JSON error object of
//! the form `{"detail": ...}`. Decoding tries the SSE shape first and falls
//! back to the error shape.

use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::Value;

use crate::constants::stream::{DATA_PREFIX, DONE_SENTINEL};

/// Decoded payload of one delta frame.
#[derive(Debug, Clone, Deserialize)]
pub struct DeltaEvent {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

impl DeltaEvent {
    /// Text fragment of the first choice, if present and non-empty.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()?
            .delta
            .content
            .as_deref()
            .filter(|content| !content.is_empty())
    }
}

/// Bare JSON error object emitted instead of an event stream.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: Value,
}

impl ErrorBody {
    pub fn message(&self) -> String {
        match &self.detail {
            Value::String(detail) => detail.clone(),
            other => other.to_string(),
        }
    }

    /// Parse a full response body as an error object.
    pub fn parse(body: &str) -> Option<Self> {
        match serde_json::from_str::<Payload>(body.trim()) {
            Ok(Payload::Error(error)) if error.is_meaningful() => Some(error),
            _ => None,
        }
    }

    /// A `null` or blank detail carries nothing worth reporting.
    fn is_meaningful(&self) -> bool {
        match &self.detail {
            Value::Null => false,
            Value::String(detail) => !detail.trim().is_empty(),
            _ => true,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Delta(DeltaEvent),
    Error(ErrorBody),
    Other(IgnoredAny),
}

#[derive(Debug, Clone)]
pub enum Frame {
    /// The `[DONE]` sentinel.
    Done,
    Delta(DeltaEvent),
    Error(ErrorBody),
    /// Valid JSON of no interest (usage-only frames, metadata).
    Ignored,
}

impl Frame {
    /// Decode one complete frame. Fails only when the cleaned frame is not JSON.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        let cleaned = strip_data_prefix(raw);
        if cleaned == DONE_SENTINEL {
            return Ok(Self::Done);
        }
        Ok(match serde_json::from_str::<Payload>(cleaned)? {
            Payload::Delta(event) => Self::Delta(event),
            Payload::Error(error) if error.is_meaningful() => Self::Error(error),
            Payload::Error(_) | Payload::Other(_) => Self::Ignored,
        })
    }

    /// Recognise an un-prefixed JSON error object in a not-yet-delimited buffer.
    pub fn decode_bare_error(raw: &str) -> Option<ErrorBody> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with(DATA_PREFIX) {
            return None;
        }
        ErrorBody::parse(trimmed)
    }
}

fn strip_data_prefix(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix(DATA_PREFIX)
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_delta_frame() {
        let frame = Frame::decode(r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#).unwrap();
        match frame {
            Frame::Delta(event) => assert_eq!(event.text(), Some("Hi")),
            other => panic!("Expected delta, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_without_prefix() {
        let frame = Frame::decode(r#"  {"choices":[{"delta":{"content":"x"}}]}  "#).unwrap();
        assert!(matches!(frame, Frame::Delta(_)));
    }

    #[test]
    fn test_decode_done_sentinel() {
        assert!(matches!(Frame::decode("data: [DONE]").unwrap(), Frame::Done));
        assert!(matches!(Frame::decode("data:[DONE]\n").unwrap(), Frame::Done));
    }

    #[test]
    fn test_empty_choices_and_null_content() {
        let frame = Frame::decode(r#"data: {"choices":[]}"#).unwrap();
        let Frame::Delta(event) = frame else { panic!("Expected delta") };
        assert_eq!(event.text(), None);

        let frame = Frame::decode(r#"data: {"choices":[{"delta":{"content":null}}]}"#).unwrap();
        let Frame::Delta(event) = frame else { panic!("Expected delta") };
        assert_eq!(event.text(), None);
    }

    #[test]
    fn test_usage_frame_is_ignored() {
        let frame = Frame::decode(r#"data: {"usage":{"prompt_tokens":3}}"#).unwrap();
        assert!(matches!(frame, Frame::Ignored));
    }

    #[test]
    fn test_invalid_json_fails() {
        assert!(Frame::decode("data: {not json").is_err());
    }

    #[test]
    fn test_bare_error_detection() {
        let error = Frame::decode_bare_error("\n{\"detail\": \"Model not found\"}\n").unwrap();
        assert_eq!(error.message(), "Model not found");

        assert!(Frame::decode_bare_error(r#"data: {"detail":"x"}"#).is_none());
        assert!(Frame::decode_bare_error(r#"{"detail": "trunc"#).is_none());
        assert!(Frame::decode_bare_error(r#"{"choices":[]}"#).is_none());
        assert!(Frame::decode_bare_error("   ").is_none());
    }

    #[test]
    fn test_empty_or_null_detail_is_not_an_error() {
        assert!(matches!(Frame::decode(r#"data: {"detail": null}"#).unwrap(), Frame::Ignored));
        assert!(matches!(Frame::decode(r#"data: {"detail": "  "}"#).unwrap(), Frame::Ignored));
        assert!(Frame::decode_bare_error(r#"{"detail": ""}"#).is_none());
        assert!(ErrorBody::parse(r#"{"detail": null}"#).is_none());
    }

    #[test]
    fn test_structured_detail_renders_as_json() {
        let error = ErrorBody::parse(r#"{"detail":[{"msg":"field required"}]}"#).unwrap();
        assert_eq!(error.message(), r#"[{"msg":"field required"}]"#);
    }
}
