//! MCP tool definitions and handlers
//!
//! Tools are registered on a [`Gate`]; listing and calling both go through it
//! so that gated tools advertise the proof field and are checked per call.

pub mod ping;
pub mod weather;

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::ErrorData as McpError;
use rmcp::model::*;
use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use serde_json::json;
use tier_gate::{DemoMode, EntitlementChecker, Gate, GateError, JsonObject, TierRegistry};

use crate::weather::WeatherProvider;

pub use ping::PingArgs;
pub use weather::{CurrentWeatherArgs, ForecastArgs};

pub const PING: &str = "ping";
pub const GET_CURRENT_WEATHER: &str = "getCurrentWeather";
pub const GET_FORECAST: &str = "getForecast";

/// Entitlement tier required by each tool
pub fn tier_registry() -> TierRegistry {
    TierRegistry::new()
        .with_tier(PING, 0)
        .with_tier(GET_CURRENT_WEATHER, 1)
        .with_tier(GET_FORECAST, 3)
}

/// Convert a schemars schema into the JSON object MCP expects
fn to_schema<T: JsonSchema>() -> Result<Arc<JsonObject>> {
    let schema = schema_for!(T);
    let json_value = serde_json::to_value(schema).context("Failed to serialize schema")?;
    let object = json_value
        .as_object()
        .context("Schema is not a JSON object")?
        .clone();
    Ok(Arc::new(object))
}

/// Deserialize tool arguments into their typed form
pub(crate) fn parse_args<T: DeserializeOwned>(arguments: JsonObject) -> Result<T, GateError> {
    serde_json::from_value(serde_json::Value::Object(arguments))
        .map_err(|e| GateError::InvalidArguments(e.to_string()))
}

/// Build the gate with every weather tool registered
pub fn build_gate(
    provider: Arc<dyn WeatherProvider>,
    checker: Arc<dyn EntitlementChecker>,
    demo_mode: DemoMode,
) -> Result<Gate> {
    let mut gate = Gate::new(tier_registry(), checker, demo_mode);

    let current_provider = Arc::clone(&provider);
    let forecast_provider = provider;

    gate.register(
        PING,
        "Check that the server is up. Free to call.",
        to_schema::<PingArgs>()?,
        ping::execute,
    )?
    .register(
        GET_CURRENT_WEATHER,
        "Get current weather conditions for a latitude/longitude.",
        to_schema::<CurrentWeatherArgs>()?,
        move |args| {
            let provider = Arc::clone(&current_provider);
            async move { weather::current(provider.as_ref(), args).await }
        },
    )?
    .register(
        GET_FORECAST,
        "Get an hourly weather forecast (up to 7 days) for a latitude/longitude.",
        to_schema::<ForecastArgs>()?,
        move |args| {
            let provider = Arc::clone(&forecast_provider);
            async move { weather::forecast(provider.as_ref(), args).await }
        },
    )?;

    Ok(gate)
}

/// List all registered tools with their advertised schemas
pub fn list_tools(gate: &Gate) -> ListToolsResult {
    ListToolsResult {
        tools: gate
            .operations()
            .iter()
            .map(|op| Tool {
                name: op.name.clone().into(),
                title: None,
                description: Some(op.description.clone().into()),
                input_schema: Arc::clone(&op.input_schema),
                output_schema: None,
                annotations: None,
                icons: None,
            })
            .collect(),
        next_cursor: None,
    }
}

/// Call a tool by name with given arguments
pub async fn call_tool(
    gate: &Gate,
    tool_name: &str,
    arguments: JsonObject,
) -> Result<CallToolResult, McpError> {
    let envelope = gate
        .call(tool_name, arguments)
        .await
        .map_err(to_mcp_error)?;

    Ok(CallToolResult::success(
        envelope
            .content
            .into_iter()
            .map(|item| Content::text(item.text))
            .collect(),
    ))
}

/// Map a gate failure onto the MCP error space
pub fn to_mcp_error(error: GateError) -> McpError {
    match error {
        GateError::Denied {
            code,
            message,
            required_tier,
        } => McpError::invalid_request(
            message,
            Some(json!({
                "code": code,
                "requiredTier": required_tier,
            })),
        ),
        GateError::UnknownOperation(_) => McpError::method_not_found::<CallToolRequestMethod>(),
        GateError::InvalidArguments(_) => McpError::invalid_params(error.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}
