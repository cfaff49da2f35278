//! Tiered authorization gate for MCP tool calls
//!
//! Every registered operation carries a required entitlement tier. Tier 0 is
//! public; any positive tier routes the call through an [`EntitlementChecker`]
//! which validates the authorization proof the calling agent attaches under
//! the reserved [`PROOF_KEY`] argument. Whatever comes back, from the handler
//! or from the checker, is normalized into a single [`Envelope`] shape.

pub mod demo;
pub mod envelope;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod proof;
pub mod registry;
pub mod schema;
pub mod traits;

pub use demo::DemoMode;
pub use envelope::{ContentItem, Envelope, normalize, wrap};
pub use error::{ConfigError, GateError};
pub use gate::{Gate, GateOutcome, Operation};
pub use ledger::{LedgerChecker, LedgerConfig};
pub use proof::{Extraction, PROOF_KEY, Proof, extract};
pub use registry::{FREE_TIER, Tier, TierRegistry};
pub use schema::augment;
pub use traits::{CallDescription, CallFn, CallFuture, CallParams, EntitlementChecker};

/// JSON object used for tool arguments and parameter schemas
pub type JsonObject = serde_json::Map<String, serde_json::Value>;
