//! Ledger-backed entitlement checker
//!
//! Verifies the caller's proof with a single `evmauth_checkAndConsume`
//! JSON-RPC call against the entitlement ledger. Denials come back the way
//! hosted checkers report them: as a successful envelope whose text is an
//! `{"error": {...}}` document. [`crate::normalize`] turns those into
//! [`GateError::Denied`].

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::JsonObject;
use crate::envelope::Envelope;
use crate::error::{ConfigError, GateError};
use crate::proof::{Proof, extract};
use crate::registry::Tier;
use crate::traits::{CallDescription, CallFn, EntitlementChecker};

const CHECK_METHOD: &str = "evmauth_checkAndConsume";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const PROOF_MISSING: &str = "PROOF_MISSING";
pub const PROOF_INVALID: &str = "PROOF_INVALID";
pub const INSUFFICIENT_TOKENS: &str = "INSUFFICIENT_TOKENS";

/// Connection settings for the entitlement ledger
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Entitlement registry contract, `0x` + 40 hex digits
    pub contract_address: String,
    pub chain_id: u64,
    pub rpc_url: String,
    /// Log proof and ledger traffic at debug level
    pub debug: bool,
}

#[derive(Clone)]
pub struct LedgerChecker {
    client: reqwest::Client,
    rpc_url: Url,
    contract_address: String,
    chain_id: u64,
    debug: bool,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: [CheckParams<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckParams<'a> {
    contract_address: &'a str,
    chain_id: u64,
    token_id: Tier,
    proof: &'a JsonObject,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Verdict>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// Ledger answer for one check
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Verdict {
    pub authorized: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl LedgerChecker {
    pub fn new(config: LedgerConfig) -> Result<Self, ConfigError> {
        if !is_valid_address(&config.contract_address) {
            return Err(ConfigError::InvalidContractAddress(config.contract_address));
        }

        let rpc_url = Url::parse(&config.rpc_url).map_err(|e| ConfigError::InvalidRpcUrl {
            url: config.rpc_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(rpc_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidRpcUrl {
                url: config.rpc_url,
                reason: "scheme must be http or https".into(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            rpc_url,
            contract_address: config.contract_address,
            chain_id: config.chain_id,
            debug: config.debug,
        })
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn authorize(
        &self,
        tier: Tier,
        call: CallDescription,
        inner: CallFn,
    ) -> Result<Value, GateError> {
        let extraction = extract(&call.params.arguments);
        let Some(proof) = extraction.proof else {
            return Ok(self.denial(
                tier,
                PROOF_MISSING,
                format!("Tool '{}' requires an authorization proof", call.params.name),
            ));
        };

        let (Some(object), Some(_)) = (proof.as_object(), proof.signature()) else {
            let message = match proof {
                Proof::Opaque(_) => "Authorization proof could not be parsed",
                Proof::Structured(_) => "Authorization proof has no signature",
            };
            return Ok(self.denial(tier, PROOF_INVALID, message.into()));
        };

        let verdict = self.check_and_consume(tier, object).await?;
        if verdict.authorized {
            inner(call).await
        } else {
            let message = verdict
                .reason
                .unwrap_or_else(|| format!("Caller does not hold token {tier}"));
            Ok(self.denial(tier, INSUFFICIENT_TOKENS, message))
        }
    }

    async fn check_and_consume(&self, tier: Tier, proof: &JsonObject) -> Result<Verdict, GateError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: CHECK_METHOD,
            params: [CheckParams {
                contract_address: &self.contract_address,
                chain_id: self.chain_id,
                token_id: tier,
                proof,
            }],
        };

        if self.debug {
            tracing::debug!(
                rpc_url = %self.rpc_url,
                tier,
                "Checking entitlement: {}",
                serde_json::to_string(&request).unwrap_or_default()
            );
        }

        let response = self
            .client
            .post(self.rpc_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| GateError::Checker(format!("ledger request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GateError::Checker(format!("ledger returned HTTP {status}")));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| GateError::Checker(format!("malformed ledger response: {e}")))?;

        match (body.result, body.error) {
            (_, Some(error)) => Err(GateError::Checker(format!(
                "ledger error {}: {}",
                error.code, error.message
            ))),
            (Some(verdict), None) => {
                if self.debug {
                    tracing::debug!(tier, authorized = verdict.authorized, "Ledger verdict");
                }
                Ok(verdict)
            }
            (None, None) => Err(GateError::Checker(
                "ledger response has neither result nor error".into(),
            )),
        }
    }

    /// Denial in the shape hosted checkers use: an envelope wrapping an error document
    fn denial(&self, tier: Tier, code: &str, message: String) -> Value {
        let payload = json!({
            "error": {
                "code": code,
                "message": message,
                "details": {
                    "requiredTokens": [tier],
                    "contractAddress": self.contract_address,
                    "chainId": self.chain_id,
                }
            }
        });
        serde_json::to_value(Envelope::text(payload.to_string())).unwrap_or(payload)
    }
}

impl EntitlementChecker for LedgerChecker {
    fn protect(&self, tier: Tier, inner: CallFn) -> CallFn {
        let checker = self.clone();
        Arc::new(move |call: CallDescription| {
            let checker = checker.clone();
            let inner = Arc::clone(&inner);
            async move { checker.authorize(tier, call, inner).await }.boxed()
        })
    }
}

fn is_valid_address(address: &str) -> bool {
    address.len() == 42
        && address.starts_with("0x")
        && address[2..].chars().all(|c| c.is_ascii_hexdigit())
}
