use anyhow::Result;
use clap::Parser;
use weather_mcp::config::ServerConfig;

#[derive(Parser)]
#[command(
    name = "weather-mcp",
    about = "Weather tools for AI agents over MCP, with token-gated access tiers",
    version
)]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment and flags still apply
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    weather_mcp::serve::start_server(cli.config).await
}
