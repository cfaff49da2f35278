//! Uniform response envelope and normalization
//!
//! Handlers return arbitrary JSON, while entitlement checkers return
//! envelopes that may hide a denial inside their first text item. Both end up
//! as an [`Envelope`], and hidden denials become real errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GateError;
use crate::registry::Tier;

const DEFAULT_DENIAL_MESSAGE: &str = "Authentication failed";

/// `{ content: [{ type: "text", text }] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub content: Vec<ContentItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type", default = "text_kind")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

fn text_kind() -> String {
    "text".into()
}

impl Envelope {
    /// Single text item envelope
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem {
                kind: text_kind(),
                text: text.into(),
            }],
        }
    }

    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|item| item.text.as_str())
    }

    /// Whether a raw value already has the envelope shape
    pub fn is_envelope(raw: &Value) -> bool {
        raw.get("content").is_some_and(Value::is_array)
    }
}

/// Wrap a handler result exactly once.
///
/// Strings are used verbatim, everything else is serialized as compact JSON.
pub fn wrap(raw: Value) -> Envelope {
    match raw {
        Value::String(text) => Envelope::text(text),
        other => Envelope::text(other.to_string()),
    }
}

/// Normalize whatever an entitlement checker handed back.
///
/// An envelope passes through unchanged unless its first text item parses to
/// a payload carrying an `error`, in which case that error is returned. A bare
/// payload with a top-level `error` is also an error. Anything else is wrapped
/// with [`wrap`].
pub fn normalize(raw: Value) -> Result<Envelope, GateError> {
    if Envelope::is_envelope(&raw) {
        let envelope: Envelope = serde_json::from_value(raw)
            .map_err(|e| GateError::MalformedEnvelope(e.to_string()))?;

        if let Some(text) = envelope.first_text()
            && let Ok(parsed) = serde_json::from_str::<Value>(text)
            && let Some(error) = embedded_error(&parsed)
        {
            return Err(denial(error));
        }
        return Ok(envelope);
    }

    if let Some(error) = embedded_error(&raw) {
        return Err(denial(error));
    }

    Ok(wrap(raw))
}

/// The `error` member of a payload, if it signals a failure
fn embedded_error(payload: &Value) -> Option<&Value> {
    payload
        .as_object()?
        .get("error")
        .filter(|error| !matches!(error, Value::Null | Value::Bool(false)))
}

fn denial(error: &Value) -> GateError {
    let message = match error {
        Value::String(message) if !message.is_empty() => message.clone(),
        _ => error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_DENIAL_MESSAGE)
            .to_string(),
    };

    GateError::Denied {
        code: error.get("code").and_then(Value::as_str).map(String::from),
        message,
        required_tier: required_tier(error),
    }
}

/// Looks in `details.requiredTokens[0]`, `details.requiredTier` and `requiredTier`
fn required_tier(error: &Value) -> Option<Tier> {
    let details = error.get("details");
    details
        .and_then(|d| d.get("requiredTokens"))
        .and_then(|tokens| tokens.get(0))
        .or_else(|| details.and_then(|d| d.get("requiredTier")))
        .or_else(|| error.get("requiredTier"))
        .and_then(Value::as_u64)
        .and_then(|tier| Tier::try_from(tier).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrap_string_verbatim() {
        let envelope = wrap(json!("sunny"));
        assert_eq!(envelope, Envelope::text("sunny"));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"content": [{"type": "text", "text": "sunny"}]})
        );
    }

    #[test]
    fn test_wrap_structured_as_compact_json() {
        let envelope = wrap(json!({"status": "ok"}));
        assert_eq!(envelope.first_text().unwrap(), r#"{"status":"ok"}"#);
    }

    #[test]
    fn test_wrap_does_not_inspect_envelopes() {
        let inner = json!({"content": [{"type": "text", "text": "x"}]});
        let envelope = wrap(inner.clone());
        let text: Value = serde_json::from_str(envelope.first_text().unwrap()).unwrap();
        assert_eq!(text, inner);
    }

    #[test]
    fn test_normalize_unwraps_nested_error() {
        let raw = json!({
            "content": [{"type": "text", "text": "{\"error\":{\"message\":\"X\"}}"}]
        });
        let err = normalize(raw).unwrap_err();
        assert_eq!(err.to_string(), "X");
        assert!(err.is_denied());
    }

    #[test]
    fn test_normalize_nested_error_details() {
        let payload = json!({
            "error": {
                "code": "INSUFFICIENT_TOKENS",
                "message": "Token 3 required",
                "details": {"requiredTokens": [3], "chainId": 1223953}
            }
        });
        let raw = json!({"content": [{"type": "text", "text": payload.to_string()}]});

        match normalize(raw).unwrap_err() {
            GateError::Denied {
                code,
                message,
                required_tier,
            } => {
                assert_eq!(code.as_deref(), Some("INSUFFICIENT_TOKENS"));
                assert_eq!(message, "Token 3 required");
                assert_eq!(required_tier, Some(3));
            }
            other => panic!("expected denial, got {other:?}"),
        }
    }

    #[test]
    fn test_normalize_passes_plain_envelopes_through() {
        for text in ["plain text", "{not json", "{\"temperature\": 21.5}", "{\"error\": null}"] {
            let raw = json!({"content": [{"type": "text", "text": text}]});
            let envelope = normalize(raw).unwrap();
            assert_eq!(envelope, Envelope::text(text));
        }
    }

    #[test]
    fn test_normalize_empty_envelope() {
        let envelope = normalize(json!({"content": []})).unwrap();
        assert!(envelope.content.is_empty());
    }

    #[test]
    fn test_normalize_top_level_error() {
        let err = normalize(json!({"error": {"message": "nope", "requiredTier": 2}})).unwrap_err();
        assert_eq!(err.to_string(), "nope");
        assert_eq!(err.required_tier(), Some(2));

        let default = normalize(json!({"error": true})).unwrap_err();
        assert_eq!(default.to_string(), "Authentication failed");

        let text = normalize(json!({"error": "expired"})).unwrap_err();
        assert_eq!(text.to_string(), "expired");
    }

    #[test]
    fn test_normalize_wraps_raw_values_once() {
        assert_eq!(normalize(json!("hello")).unwrap(), Envelope::text("hello"));

        let envelope = normalize(json!({"status": "ok"})).unwrap();
        let text: Value = serde_json::from_str(envelope.first_text().unwrap()).unwrap();
        assert_eq!(text, json!({"status": "ok"}));
    }

    #[test]
    fn test_normalize_rejects_malformed_content() {
        let err = normalize(json!({"content": ["not an item"]})).unwrap_err();
        assert!(matches!(err, GateError::MalformedEnvelope(_)));
    }
}
