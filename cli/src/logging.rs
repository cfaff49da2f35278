use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "weather-mcp.log";

/// Where log output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// Standard error; stdout is reserved for the stdio transport
    Stderr,
    /// Daily-rotated files (`weather-mcp.log.YYYY-MM-DD`) in this directory
    File(PathBuf),
}

/// Initialize logging for the weather MCP server
///
/// The log level can be controlled via the RUST_LOG environment variable:
/// - RUST_LOG=debug weather-mcp  (verbose logging)
/// - RUST_LOG=info weather-mcp   (default level)
/// - RUST_LOG=error weather-mcp  (errors only)
///
/// Without RUST_LOG the `debug` flag picks between info and debug.
pub fn init(sink: &LogSink, debug: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(debug)));

    let (file_layer, stderr_layer) = match sink {
        LogSink::File(dir) => {
            prepare_log_dir(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false) // No ANSI colors in log files
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true);
            (Some(layer), None)
        }
        LogSink::Stderr => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(false)
                .compact();
            (None, Some(layer))
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let LogSink::File(dir) = sink {
        tracing::info!("Logging initialized to {}", dir.display());
    }

    Ok(())
}

fn default_filter(debug: bool) -> &'static str {
    if debug {
        "weather_mcp=debug,tier_gate=debug,rmcp=debug"
    } else {
        "weather_mcp=info,tier_gate=info,rmcp=info"
    }
}

/// Ensure the log directory exists
fn prepare_log_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))
}
