pub mod config;
pub mod logging;
pub mod mcp;
pub mod serve;
pub mod types;
pub mod weather;

pub use types::{Transport, Units};
