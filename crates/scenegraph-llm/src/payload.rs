//! Request payload projected from an input record.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The subset of a record's `generated` block sent to the backend.
///
/// Values are copied as-is (no type coercion); missing fields fall back to
/// `""`, `""` and `[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePayload {
    pub scene_description: Value,
    pub match_context: Value,
    pub messages: Value,
}

impl Default for ScenePayload {
    fn default() -> Self {
        Self {
            scene_description: json!(""),
            match_context: json!(""),
            messages: json!([]),
        }
    }
}

impl ScenePayload {
    pub fn from_record(record: &Value) -> Self {
        let mut payload = Self::default();
        let Some(generated) = record.get("generated") else {
            return payload;
        };
        let Some(generated) = generated.as_object() else {
            tracing::debug!("record.generated is not an object; using empty payload");
            return payload;
        };
        if let Some(v) = generated.get("scene_description") {
            payload.scene_description = v.clone();
        }
        if let Some(v) = generated.get("match_context") {
            payload.match_context = v.clone();
        }
        if let Some(v) = generated.get("messages") {
            payload.messages = v.clone();
        }
        payload
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
