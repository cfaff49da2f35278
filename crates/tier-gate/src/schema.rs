//! Parameter schema augmentation for gated tools

use std::sync::Arc;

use serde_json::{Value, json};

use crate::JsonObject;
use crate::proof::PROOF_KEY;
use crate::registry::{FREE_TIER, Tier};

const PROOF_FIELD_DESCRIPTION: &str =
    "Authorization proof for this tool. Supplied automatically by the calling agent.";

/// Advertise the optional proof field on a gated tool's input schema.
///
/// Free tools and schemas that already declare the field are returned as-is
/// (same `Arc`). Otherwise a new schema is built; the shared input is never
/// modified.
pub fn augment(schema: &Arc<JsonObject>, tier: Tier) -> Arc<JsonObject> {
    if tier == FREE_TIER || declares_proof(schema) {
        return Arc::clone(schema);
    }

    let mut augmented = JsonObject::clone(schema);
    augmented
        .entry("type")
        .or_insert_with(|| Value::String("object".into()));

    let field = json!({ "description": PROOF_FIELD_DESCRIPTION });
    match augmented.get_mut("properties") {
        Some(Value::Object(properties)) => {
            properties.insert(PROOF_KEY.into(), field);
        }
        _ => {
            let mut properties = JsonObject::new();
            properties.insert(PROOF_KEY.into(), field);
            augmented.insert("properties".into(), Value::Object(properties));
        }
    }

    Arc::new(augmented)
}

fn declares_proof(schema: &JsonObject) -> bool {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|properties| properties.contains_key(PROOF_KEY))
}
