//! Gate decision procedure
//!
//! Each call takes exactly one of three paths:
//!
//! ```text
//! demo mode on  -> strip proof -> handler                     -> Allowed
//! tier == 0     -> handler (args untouched)                   -> Allowed
//! tier  > 0     -> checker(original args) -> strip -> handler -> normalize
//!                                                             -> Allowed | Denied | Error
//! ```
//!
//! The gated path strips the proof twice: once up front for diagnostics and
//! once inside the callback the checker runs, because the checker hands the
//! call back in its own shape.

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::JsonObject;
use crate::demo::DemoMode;
use crate::envelope::{Envelope, normalize, wrap};
use crate::error::{ConfigError, GateError};
use crate::proof::{Extraction, extract};
use crate::registry::{FREE_TIER, Tier, TierRegistry};
use crate::schema::augment;
use crate::traits::{CallDescription, CallFn, EntitlementChecker};

type Handler = Arc<dyn Fn(JsonObject) -> BoxFuture<'static, Result<Value, GateError>> + Send + Sync>;

/// A registered tool
#[derive(Clone)]
pub struct Operation {
    pub name: String,
    pub description: String,
    /// Advertised schema, already augmented for the operation's tier
    pub input_schema: Arc<JsonObject>,
    pub tier: Tier,
    handler: Handler,
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("tier", &self.tier)
            .finish_non_exhaustive()
    }
}

/// Per-call decision
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Allowed(Envelope),
    Denied {
        code: Option<String>,
        reason: String,
        required_tier: Tier,
    },
    Error(GateError),
}

impl GateOutcome {
    pub fn into_result(self) -> Result<Envelope, GateError> {
        match self {
            GateOutcome::Allowed(envelope) => Ok(envelope),
            GateOutcome::Denied {
                code,
                reason,
                required_tier,
            } => Err(GateError::Denied {
                code,
                message: reason,
                required_tier: Some(required_tier),
            }),
            GateOutcome::Error(error) => Err(error),
        }
    }

    fn from_handler(result: Result<Value, GateError>) -> Self {
        match result {
            Ok(raw) => GateOutcome::Allowed(wrap(raw)),
            Err(error) => GateOutcome::Error(error),
        }
    }
}

/// Tool registry plus the gate every call goes through
pub struct Gate {
    operations: Vec<Operation>,
    registry: TierRegistry,
    checker: Arc<dyn EntitlementChecker>,
    demo_mode: DemoMode,
}

impl Gate {
    pub fn new(
        registry: TierRegistry,
        checker: Arc<dyn EntitlementChecker>,
        demo_mode: DemoMode,
    ) -> Self {
        Self {
            operations: Vec::new(),
            registry,
            checker,
            demo_mode,
        }
    }

    /// Register a tool.
    ///
    /// The schema is augmented with the proof field according to the tier the
    /// registry assigns to `name`.
    pub fn register<F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Arc<JsonObject>,
        handler: F,
    ) -> Result<&mut Self, ConfigError>
    where
        F: Fn(JsonObject) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, GateError>> + Send + 'static,
    {
        let name = name.into();
        if self.operation(&name).is_some() {
            return Err(ConfigError::DuplicateOperation(name));
        }

        let tier = self.registry.required_tier(&name);
        tracing::debug!(operation = %name, tier, "Registering tool");

        self.operations.push(Operation {
            input_schema: augment(&input_schema, tier),
            description: description.into(),
            tier,
            handler: Arc::new(move |args| handler(args).boxed()),
            name,
        });
        Ok(self)
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn demo_mode(&self) -> &DemoMode {
        &self.demo_mode
    }

    /// Run a call and return the envelope or the failure
    pub async fn call(&self, name: &str, args: JsonObject) -> Result<Envelope, GateError> {
        self.evaluate(name, args).await.into_result()
    }

    /// Run a call through the gate
    pub async fn evaluate(&self, name: &str, args: JsonObject) -> GateOutcome {
        let Some(op) = self.operation(name) else {
            return GateOutcome::Error(GateError::UnknownOperation(name.to_string()));
        };

        if self.demo_mode.is_enabled() {
            tracing::debug!(operation = name, "Demo mode, skipping entitlement check");
            let Extraction { clean_args, .. } = extract(&args);
            return GateOutcome::from_handler((op.handler)(clean_args).await);
        }

        let tier = self.registry.required_tier(name);
        if tier == FREE_TIER {
            tracing::debug!(operation = name, "Free tool, calling handler directly");
            return GateOutcome::from_handler((op.handler)(args).await);
        }

        self.gated(op, tier, args).await
    }

    async fn gated(&self, op: &Operation, tier: Tier, args: JsonObject) -> GateOutcome {
        let extraction = extract(&args);
        if let Some(reason) = &extraction.parse_failure {
            tracing::warn!(
                operation = %op.name,
                "Authorization proof is not valid JSON, passing it on as-is: {}",
                reason
            );
        }
        if extraction.proof.is_none() {
            tracing::debug!(operation = %op.name, tier, "No authorization proof supplied");
        }

        let call = CallDescription::tools_call(op.name.clone(), args);
        let protected = self.checker.protect(tier, inner_call(Arc::clone(&op.handler)));

        match protected(call).await.and_then(normalize) {
            Ok(envelope) => GateOutcome::Allowed(envelope),
            Err(GateError::Denied {
                code,
                message,
                required_tier,
            }) => {
                let required_tier = required_tier.unwrap_or(tier);
                tracing::info!(
                    operation = %op.name,
                    required_tier,
                    code = code.as_deref().unwrap_or("unknown"),
                    "Entitlement denied: {}",
                    message
                );
                GateOutcome::Denied {
                    code,
                    reason: message,
                    required_tier,
                }
            }
            Err(error) => {
                tracing::error!(operation = %op.name, "Gated call failed: {}", error);
                GateOutcome::Error(error)
            }
        }
    }
}

/// Callback handed to the checker; only runs once entitlement holds
fn inner_call(handler: Handler) -> CallFn {
    Arc::new(move |call: CallDescription| {
        let handler = Arc::clone(&handler);
        async move {
            let Extraction { clean_args, .. } = extract(&call.params.arguments);
            let raw = handler(clean_args).await?;
            serde_json::to_value(wrap(raw)).map_err(|e| GateError::Handler(e.to_string()))
        }
        .boxed()
    })
}
