//! Outcome records: exactly one per processed input line.
//!
//! Wire shapes (field order as written):
//! - `{image, error: "graph_json_parse_failed", raw}`
//! - `{image, error: "graph_schema_invalid", reason, raw_graph}`
//! - `{image, graph}`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parse::{parse_response, ParseMode};
use crate::validate::validate_graph;

pub const GRAPH_JSON_PARSE_FAILED: &str = "graph_json_parse_failed";
pub const GRAPH_SCHEMA_INVALID: &str = "graph_schema_invalid";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Accepted {
        #[serde(default)]
        image: Value,
        graph: Value,
    },
    SchemaInvalid {
        #[serde(default)]
        image: Value,
        error: String,
        reason: String,
        raw_graph: Value,
    },
    ParseFailed {
        #[serde(default)]
        image: Value,
        error: String,
        raw: String,
    },
}

impl Outcome {
    pub fn parse_failed(image: Value, raw: impl Into<String>) -> Self {
        Outcome::ParseFailed {
            image,
            error: GRAPH_JSON_PARSE_FAILED.to_string(),
            raw: raw.into(),
        }
    }

    pub fn schema_invalid(image: Value, reason: impl Into<String>, raw_graph: Value) -> Self {
        Outcome::SchemaInvalid {
            image,
            error: GRAPH_SCHEMA_INVALID.to_string(),
            reason: reason.into(),
            raw_graph,
        }
    }

    pub fn accepted(image: Value, graph: Value) -> Self {
        Outcome::Accepted { image, graph }
    }

    /// Parse and validate one raw model response.
    pub fn classify(image: Value, raw: &str, mode: ParseMode) -> Self {
        match parse_response(raw, mode) {
            None => Outcome::parse_failed(image, raw),
            Some(doc) => Outcome::from_document(image, doc),
        }
    }

    /// Validate an already-parsed document.
    pub fn from_document(image: Value, doc: Value) -> Self {
        match validate_graph(&doc) {
            Ok(()) => Outcome::accepted(image, doc),
            Err(violation) => Outcome::schema_invalid(image, violation.to_string(), doc),
        }
    }

    /// Run the current parser and validator again over whatever this record
    /// retained (the graph, the rejected document, or the raw text).
    pub fn reclassify(self, mode: ParseMode) -> Self {
        match self {
            Outcome::Accepted { image, graph } => Outcome::from_document(image, graph),
            Outcome::SchemaInvalid {
                image, raw_graph, ..
            } => Outcome::from_document(image, raw_graph),
            Outcome::ParseFailed { image, raw, .. } => Outcome::classify(image, &raw, mode),
        }
    }

    pub fn image(&self) -> &Value {
        match self {
            Outcome::Accepted { image, .. }
            | Outcome::SchemaInvalid { image, .. }
            | Outcome::ParseFailed { image, .. } => image,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }

    /// Error tag for rejected records, `None` when accepted.
    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Accepted { .. } => None,
            Outcome::SchemaInvalid { error, .. } | Outcome::ParseFailed { error, .. } => {
                Some(error)
            }
        }
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
