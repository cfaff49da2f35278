pub mod entitlement;

pub use entitlement::{CallDescription, CallFn, CallFuture, CallParams, EntitlementChecker};
