use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::JsonObject;
use crate::error::GateError;
use crate::registry::Tier;

/// Method name carried by every call description
pub const TOOLS_CALL_METHOD: &str = "tools/call";

/// Future produced by a (possibly protected) tool call
pub type CallFuture = BoxFuture<'static, Result<Value, GateError>>;

/// A tool call as seen by the entitlement checker
pub type CallFn = Arc<dyn Fn(CallDescription) -> CallFuture + Send + Sync>;

/// Protocol-shaped description of a tool call.
///
/// Serializes as `{ "method": "tools/call", "params": { "name", "arguments" } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDescription {
    pub method: String,
    pub params: CallParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: JsonObject,
}

impl CallDescription {
    pub fn tools_call(name: impl Into<String>, arguments: JsonObject) -> Self {
        Self {
            method: TOOLS_CALL_METHOD.into(),
            params: CallParams {
                name: name.into(),
                arguments,
            },
        }
    }
}

/// Defines the contract for entitlement checkers.
///
/// A checker wraps an inner call so that it only runs when the caller holds
/// the required tier. The wrapped function receives the original, unstripped
/// arguments and is responsible for locating the proof itself. A denial may
/// be returned either as an error or as an envelope whose text carries an
/// `error` payload; the gate treats both as denials.
pub trait EntitlementChecker: Send + Sync {
    fn protect(&self, tier: Tier, inner: CallFn) -> CallFn;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_description_shape() {
        let arguments = json!({"latitude": 1.5, "__evmauth": "p"})
            .as_object()
            .cloned()
            .unwrap();
        let call = CallDescription::tools_call("getForecast", arguments);

        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({
                "method": "tools/call",
                "params": {
                    "name": "getForecast",
                    "arguments": {"latitude": 1.5, "__evmauth": "p"}
                }
            })
        );
    }

    #[test]
    fn test_missing_arguments_default_to_empty() {
        let call: CallDescription =
            serde_json::from_value(json!({"method": "tools/call", "params": {"name": "ping"}}))
                .unwrap();
        assert!(call.params.arguments.is_empty());
    }
}
