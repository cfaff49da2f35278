use thiserror::Error;

use crate::registry::Tier;

/// Failures surfaced by a gated tool call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    /// The entitlement checker refused the call
    #[error("{message}")]
    Denied {
        /// Machine-readable reason, e.g. `PROOF_MISSING`
        code: Option<String>,
        message: String,
        required_tier: Option<Tier>,
    },

    #[error("Entitlement check failed: {0}")]
    Checker(String),

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    #[error("Malformed response envelope: {0}")]
    MalformedEnvelope(String),

    #[error("{0}")]
    Handler(String),
}

impl GateError {
    /// Required tier carried by a denial, if any
    pub fn required_tier(&self) -> Option<Tier> {
        match self {
            GateError::Denied { required_tier, .. } => *required_tier,
            _ => None,
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, GateError::Denied { .. })
    }
}

/// Startup failures; these abort the process
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid contract address '{0}': expected 0x followed by 40 hex digits")]
    InvalidContractAddress(String),

    #[error("Invalid RPC URL '{url}': {reason}")]
    InvalidRpcUrl { url: String, reason: String },

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),

    #[error("Tool '{0}' is already registered")]
    DuplicateOperation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_displays_bare_message() {
        let err = GateError::Denied {
            code: Some("PROOF_MISSING".into()),
            message: "No authorization proof supplied".into(),
            required_tier: Some(2),
        };
        assert_eq!(err.to_string(), "No authorization proof supplied");
        assert_eq!(err.required_tier(), Some(2));
        assert!(err.is_denied());
    }

    #[test]
    fn test_checker_error_keeps_original_message() {
        let err = GateError::Checker("connection refused".into());
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.required_tier(), None);
        assert!(!err.is_denied());
    }
}
