//! MCP server implementation
//!
//! This module contains the WeatherServer struct and its ServerHandler
//! implementation, delegating every tool call to the tier gate.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::ErrorData as McpError;
use rmcp::ServerHandler;
use rmcp::model::*;
use rmcp::service::{RequestContext, RoleServer};
use tier_gate::{DemoMode, Gate, JsonObject, LedgerChecker, PROOF_KEY};

use crate::config::ServerConfig;
use crate::weather::OpenMeteoProvider;

/// Main MCP server struct for the weather tools
#[derive(Clone)]
pub struct WeatherServer {
    gate: Arc<Gate>,
}

impl WeatherServer {
    pub fn new(gate: Gate) -> Self {
        Self {
            gate: Arc::new(gate),
        }
    }

    /// Build the production server: ledger-backed checks and Open-Meteo data
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let checker = LedgerChecker::new(config.ledger_config())
            .context("Failed to construct entitlement checker")?;
        let provider = OpenMeteoProvider::new(config.weather_api_base.as_str())
            .context("Failed to create weather client")?;

        let gate = crate::mcp::tools::build_gate(
            Arc::new(provider),
            Arc::new(checker),
            DemoMode::new(config.demo_mode),
        )?;
        Ok(Self::new(gate))
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn list(&self) -> ListToolsResult {
        crate::mcp::tools::list_tools(&self.gate)
    }

    /// Run one tool call through the gate
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: JsonObject,
    ) -> Result<CallToolResult, McpError> {
        crate::mcp::tools::call_tool(&self.gate, name, arguments).await
    }
}

impl ServerHandler for WeatherServer {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: ProtocolVersion::V_2025_03_26,
            server_info: Implementation {
                name: "weather-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Weather MCP Server".into()),
                icons: None,
                website_url: None,
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(format!(
                "Weather tools with token-gated access tiers. \
                 `ping` is free. `getCurrentWeather` and `getForecast` require an \
                 entitlement: attach the authorization proof under the `{PROOF_KEY}` \
                 argument. Calls without a valid proof are rejected with the required tier."
            )),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let result = self.list();
        tracing::info!("ListTools returning {} tools", result.tools.len());
        Ok(result)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        tracing::debug!(tool = %request.name, "CallTool");
        self.dispatch(&request.name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ServerConfig,
    }

    fn config(address: &str) -> ServerConfig {
        TestCli::try_parse_from(["weather-mcp", "--contract-address", address])
            .unwrap()
            .config
    }

    #[test]
    fn test_from_config_builds_all_tools() {
        let server =
            WeatherServer::from_config(&config("0x5448Dc20ad9e0cDb5Dd0db25e814545d1aa08D96"))
                .unwrap();
        assert_eq!(server.list().tools.len(), 3);
        assert!(!server.gate().demo_mode().is_enabled());
    }

    #[test]
    fn test_from_config_rejects_bad_contract_address() {
        let err = WeatherServer::from_config(&config("not-an-address"))
            .err()
            .unwrap();
        let message = format!("{err:#}");
        assert!(message.contains("Failed to construct entitlement checker"));
        assert!(message.contains("not-an-address"));
    }

    #[test]
    fn test_get_info_returns_correct_metadata() {
        let server =
            WeatherServer::from_config(&config("0x5448Dc20ad9e0cDb5Dd0db25e814545d1aa08D96"))
                .unwrap();
        let info = server.get_info();

        assert_eq!(info.protocol_version, ProtocolVersion::V_2025_03_26);
        assert_eq!(info.server_info.name, "weather-mcp");
        assert_eq!(info.server_info.version, env!("CARGO_PKG_VERSION"));

        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.capabilities.prompts.is_none());

        let instructions = info.instructions.unwrap();
        assert!(instructions.contains(PROOF_KEY));
    }
}
