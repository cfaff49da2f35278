//! MCP server implementation for the weather tools
//!
//! This module provides the Model Context Protocol (MCP) server handler and
//! the gated tool definitions it serves.

pub mod server;
pub mod tools;

// Re-export the main server struct for convenience
pub use server::WeatherServer;
