//! Server configuration
//!
//! Every setting can come from a command-line flag or from the environment.
//! A `.env` file in the working directory is loaded before parsing, so the
//! usual setup is an `.env` next to the binary:
//!
//! ```text
//! EVMAUTH_CONTRACT_ADDRESS=0x5448Dc20ad9e0cDb5Dd0db25e814545d1aa08D96
//! EVMAUTH_CHAIN_ID=1223953
//! EVMAUTH_RPC_URL=https://rpc.testnet.radiustech.xyz
//! DEMO_MODE=false
//! DEBUG=false
//! ```
//!
//! Configuration is read once at startup. The demo-mode value only seeds the
//! gate's [`tier_gate::DemoMode`] switch.

use std::path::PathBuf;

use clap::Args;
use clap::builder::FalseyValueParser;
use tier_gate::LedgerConfig;

use crate::logging::LogSink;
use crate::types::Transport;
use crate::weather::open_meteo::DEFAULT_API_BASE;

pub const DEFAULT_CHAIN_ID: u64 = 1223953;
pub const DEFAULT_RPC_URL: &str = "https://rpc.testnet.radiustech.xyz";
pub const DEFAULT_PORT: u16 = 8085;

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Entitlement registry contract address (0x + 40 hex digits)
    #[arg(long, env = "EVMAUTH_CONTRACT_ADDRESS")]
    pub contract_address: String,

    /// Chain id of the network hosting the registry
    #[arg(long, env = "EVMAUTH_CHAIN_ID", default_value_t = DEFAULT_CHAIN_ID)]
    pub chain_id: u64,

    /// JSON-RPC endpoint used for entitlement checks
    #[arg(long, env = "EVMAUTH_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Skip all entitlement checks (development only)
    #[arg(long, env = "DEMO_MODE", value_parser = FalseyValueParser::new())]
    pub demo_mode: bool,

    /// Verbose logging, including entitlement ledger traffic
    #[arg(long, short = 'v', env = "DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    /// Write logs to daily-rotated files in this directory instead of stderr
    #[arg(long, env = "LOG_FILE_DIR")]
    pub log_file_dir: Option<PathBuf>,

    /// Use stdio transport instead of HTTP
    #[arg(long)]
    pub stdio: bool,

    /// Port for HTTP server (ignored with --stdio)
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Base URL of the Open-Meteo compatible weather API
    #[arg(long, env = "WEATHER_API_BASE", default_value = DEFAULT_API_BASE)]
    pub weather_api_base: String,
}

impl ServerConfig {
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            contract_address: self.contract_address.clone(),
            chain_id: self.chain_id,
            rpc_url: self.rpc_url.clone(),
            debug: self.debug,
        }
    }

    pub fn log_sink(&self) -> LogSink {
        match &self.log_file_dir {
            Some(dir) => LogSink::File(dir.clone()),
            None => LogSink::Stderr,
        }
    }

    pub fn transport(&self) -> Transport {
        if self.stdio {
            Transport::Stdio
        } else {
            Transport::Http
        }
    }
}
