//! Authorization proof extraction
//!
//! The calling agent attaches its proof under [`PROOF_KEY`], either as a JSON
//! object or as a JSON document serialized to a string. Extraction never
//! fails: an unparseable proof is kept as [`Proof::Opaque`] and reported
//! through [`Extraction::parse_failure`] so the entitlement checker can make
//! the actual decision.

use serde_json::Value;

use crate::JsonObject;

/// Reserved argument key carrying the authorization proof
pub const PROOF_KEY: &str = "__evmauth";

/// Authorization proof as supplied by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum Proof {
    Structured(JsonObject),
    /// Present but not parseable into an object
    Opaque(String),
}

impl Proof {
    pub fn as_object(&self) -> Option<&JsonObject> {
        match self {
            Proof::Structured(object) => Some(object),
            Proof::Opaque(_) => None,
        }
    }

    /// Non-empty `signature` field of a structured proof
    pub fn signature(&self) -> Option<&str> {
        self.as_object()?
            .get("signature")?
            .as_str()
            .filter(|signature| !signature.is_empty())
    }
}

/// Result of separating the proof from the rest of the arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub proof: Option<Proof>,
    /// Arguments with [`PROOF_KEY`] removed
    pub clean_args: JsonObject,
    /// Diagnostic for a proof that could not be parsed; never a denial
    pub parse_failure: Option<String>,
}

/// Split the proof off an argument bag.
///
/// The returned clean arguments are a copy and never contain [`PROOF_KEY`].
pub fn extract(args: &JsonObject) -> Extraction {
    let mut clean_args = args.clone();
    let Some(raw) = clean_args.remove(PROOF_KEY) else {
        return Extraction {
            proof: None,
            clean_args,
            parse_failure: None,
        };
    };

    let (proof, parse_failure) = match raw {
        Value::Object(object) => (Proof::Structured(object), None),
        Value::String(text) => parse_text(text),
        other => (
            Proof::Opaque(other.to_string()),
            Some(format!("expected an object or a JSON string, got {}", kind(&other))),
        ),
    };

    Extraction {
        proof: Some(proof),
        clean_args,
        parse_failure,
    }
}

fn parse_text(text: String) -> (Proof, Option<String>) {
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(object)) => (Proof::Structured(object), None),
        Ok(other) => {
            let reason = format!("proof decodes to {} instead of an object", kind(&other));
            (Proof::Opaque(text), Some(reason))
        }
        Err(e) => (Proof::Opaque(text), Some(e.to_string())),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_absent_proof_returns_copy() {
        let input = args(json!({"latitude": 1.0, "longitude": 2.0}));
        let extraction = extract(&input);

        assert_eq!(extraction.proof, None);
        assert_eq!(extraction.clean_args, input);
        assert_eq!(extraction.parse_failure, None);
    }

    #[test]
    fn test_structured_proof_used_as_is() {
        let input = args(json!({
            "latitude": 1.0,
            "__evmauth": {"signature": "0xabc", "challenge": "c-1"}
        }));
        let extraction = extract(&input);

        let proof = extraction.proof.unwrap();
        assert_eq!(proof.signature(), Some("0xabc"));
        assert_eq!(proof.as_object().unwrap()["challenge"], "c-1");
        assert!(!extraction.clean_args.contains_key(PROOF_KEY));
        assert_eq!(extraction.clean_args["latitude"], 1.0);
        // Input is untouched
        assert!(input.contains_key(PROOF_KEY));
    }

    #[test]
    fn test_text_proof_is_parsed() {
        let input = args(json!({"__evmauth": "{\"signature\":\"0xdef\"}"}));
        let extraction = extract(&input);

        assert_eq!(extraction.proof.unwrap().signature(), Some("0xdef"));
        assert!(extraction.clean_args.is_empty());
        assert_eq!(extraction.parse_failure, None);
    }

    #[test]
    fn test_invalid_text_proof_is_opaque_not_fatal() {
        let input = args(json!({"latitude": 37.7749, "__evmauth": "<invalid-json>"}));
        let extraction = extract(&input);

        assert_eq!(
            extraction.proof,
            Some(Proof::Opaque("<invalid-json>".into()))
        );
        assert!(extraction.parse_failure.is_some());
        assert!(!extraction.clean_args.contains_key(PROOF_KEY));
        assert_eq!(extraction.clean_args["latitude"], 37.7749);
    }

    #[test]
    fn test_non_object_proofs_are_opaque() {
        let number = extract(&args(json!({"__evmauth": 42})));
        assert_eq!(number.proof, Some(Proof::Opaque("42".into())));
        assert!(number.parse_failure.unwrap().contains("a number"));

        let text_array = extract(&args(json!({"__evmauth": "[1,2]"})));
        assert_eq!(text_array.proof, Some(Proof::Opaque("[1,2]".into())));
        assert!(text_array.parse_failure.unwrap().contains("an array"));
    }

    #[test]
    fn test_missing_or_empty_signature() {
        let missing = Proof::Structured(args(json!({"challenge": "c"})));
        assert_eq!(missing.signature(), None);

        let empty = Proof::Structured(args(json!({"signature": ""})));
        assert_eq!(empty.signature(), None);

        assert_eq!(Proof::Opaque("x".into()).signature(), None);
    }

    #[test]
    fn test_reextraction_is_a_no_op() {
        let inputs = [
            json!({}),
            json!({"a": 1, "__evmauth": "nope"}),
            json!({"__evmauth": {"signature": "s"}, "nested": {"__evmauth": 1}}),
        ];

        for input in inputs {
            let first = extract(&args(input));
            let second = extract(&first.clean_args);
            assert_eq!(second.proof, None);
            assert_eq!(second.clean_args, first.clean_args);
        }
    }
}
