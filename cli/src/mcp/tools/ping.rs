//! Free health-check tool

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tier_gate::{GateError, JsonObject};

/// Arguments for the ping tool (none)
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct PingArgs {}

pub async fn execute(arguments: JsonObject) -> Result<Value, GateError> {
    let PingArgs {} = super::parse_args(arguments)?;
    tracing::debug!("Ping");

    Ok(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ping_reports_ok_with_timestamp() {
        let value = execute(JsonObject::new()).await.unwrap();
        assert_eq!(value["status"], "ok");

        let timestamp = value["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_ping_ignores_extra_arguments() {
        let args = json!({"__evmauth": {"signature": "0xabc"}, "verbose": true})
            .as_object()
            .cloned()
            .unwrap();
        assert!(execute(args).await.is_ok());
    }
}
