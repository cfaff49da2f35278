use anyhow::Result;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use std::net::SocketAddr;

use crate::config::ServerConfig;
use crate::mcp::WeatherServer;
use crate::types::Transport;

pub async fn start_server(config: ServerConfig) -> Result<()> {
    crate::logging::init(&config.log_sink(), config.debug)?;

    if config.debug {
        tracing::info!("Debug logging enabled");
    }

    tracing::info!(
        contract = %config.contract_address,
        chain_id = config.chain_id,
        rpc_url = %config.rpc_url,
        transport = %config.transport(),
        "Starting weather MCP server"
    );

    if config.demo_mode {
        tracing::warn!("DEMO MODE: entitlement checks are disabled, every tool is free");
        eprintln!("WARNING: demo mode is on, entitlement checks are disabled");
    }

    let server = WeatherServer::from_config(&config)?;

    let tools = server.list();
    tracing::info!("Registered {} tools", tools.tools.len());
    for op in server.gate().operations() {
        tracing::info!(tool = %op.name, tier = op.tier, "Tool available");
    }

    match config.transport() {
        Transport::Stdio => {
            eprintln!("Starting weather MCP server (stdio mode)...");
            let service = server.serve(stdio()).await?;
            service.waiting().await?;
        }
        Transport::Http => {
            start_http_server(server, config.port).await?;
        }
    }

    Ok(())
}

fn bind_address(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

async fn start_http_server(server: WeatherServer, port: u16) -> Result<()> {
    use rmcp::transport::streamable_http_server::{
        StreamableHttpService, session::local::LocalSessionManager,
    };

    let addr = bind_address(port);

    eprintln!("Starting weather MCP server (HTTP/Streamable mode)...");
    eprintln!("Listening on http://{}", addr);
    eprintln!("MCP endpoint: http://{}/mcp", addr);

    // Create streamable HTTP service
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    // Create router with single /mcp endpoint
    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Received shutdown signal");
            eprintln!("Received shutdown signal...");
        })
        .await?;

    Ok(())
}
