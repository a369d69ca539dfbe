//! Graph validation over a parsed JSON document.
//!
//! Gates run in a fixed order and the first failing gate decides the
//! verdict:
//! 1) document is an object
//! 2) top-level keys are exactly `{meta, nodes, edges}`
//! 3) `meta` is an object, `nodes` and `edges` are arrays
//! 4) `meta.directed` is a boolean
//! 5) every node: object with `id` + `t`, non-empty unique string id, known
//!    type, `text` only on `message` nodes
//! 6) every edge: object with `s` + `t` + `r`, both ends resolve to a node
//!    id, known relation
//!
//! All nodes are checked before any edge, so an edge may point at a node
//! declared after it in the document.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

use crate::vocab::{NodeType, Relation};

const TOP_LEVEL_KEYS: [&str; 3] = ["meta", "nodes", "edges"];

/// The first schema gate a document failed.
///
/// `Display` is the human-readable reason written to outcome records; it is
/// stable across runs for a given input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaViolation {
    #[error("graph is not a JSON object")]
    NotAnObject,
    #[error("top-level keys must be exactly ['edges', 'meta', 'nodes']")]
    TopLevelKeys,
    #[error("meta must be an object")]
    MetaNotObject,
    #[error("nodes must be an array")]
    NodesNotArray,
    #[error("edges must be an array")]
    EdgesNotArray,
    #[error("meta.directed must exist and be boolean")]
    DirectedNotBoolean,
    #[error("node is not an object")]
    NodeNotObject,
    #[error("each node must have id and t")]
    NodeMissingField,
    #[error("node.id must be non-empty string")]
    NodeIdInvalid,
    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),
    #[error("node type not allowed: {0}")]
    NodeTypeNotAllowed(String),
    #[error("only message nodes may include text")]
    TextOnNonMessage,
    #[error("edge is not an object")]
    EdgeNotObject,
    #[error("each edge must have s, t, r")]
    EdgeMissingField,
    #[error("edge source id not found: {0}")]
    UnknownSource(String),
    #[error("edge target id not found: {0}")]
    UnknownTarget(String),
    #[error("edge relation not allowed: {0}")]
    RelationNotAllowed(String),
}

impl SchemaViolation {
    /// Short machine-friendly name of the failing gate.
    pub fn code(&self) -> &'static str {
        match self {
            SchemaViolation::NotAnObject => "not_an_object",
            SchemaViolation::TopLevelKeys => "top_level_keys",
            SchemaViolation::MetaNotObject => "meta_not_object",
            SchemaViolation::NodesNotArray => "nodes_not_array",
            SchemaViolation::EdgesNotArray => "edges_not_array",
            SchemaViolation::DirectedNotBoolean => "directed_not_boolean",
            SchemaViolation::NodeNotObject => "node_not_object",
            SchemaViolation::NodeMissingField => "node_missing_field",
            SchemaViolation::NodeIdInvalid => "node_id_invalid",
            SchemaViolation::DuplicateNodeId(_) => "duplicate_node_id",
            SchemaViolation::NodeTypeNotAllowed(_) => "node_type_not_allowed",
            SchemaViolation::TextOnNonMessage => "text_on_non_message",
            SchemaViolation::EdgeNotObject => "edge_not_object",
            SchemaViolation::EdgeMissingField => "edge_missing_field",
            SchemaViolation::UnknownSource(_) => "unknown_source",
            SchemaViolation::UnknownTarget(_) => "unknown_target",
            SchemaViolation::RelationNotAllowed(_) => "relation_not_allowed",
        }
    }
}

pub fn validate_graph(doc: &Value) -> Result<(), SchemaViolation> {
    let Value::Object(root) = doc else {
        return Err(SchemaViolation::NotAnObject);
    };

    if root.len() != TOP_LEVEL_KEYS.len() || !TOP_LEVEL_KEYS.iter().all(|k| root.contains_key(*k)) {
        return Err(SchemaViolation::TopLevelKeys);
    }

    let meta = root["meta"]
        .as_object()
        .ok_or(SchemaViolation::MetaNotObject)?;
    let nodes = root["nodes"]
        .as_array()
        .ok_or(SchemaViolation::NodesNotArray)?;
    let edges = root["edges"]
        .as_array()
        .ok_or(SchemaViolation::EdgesNotArray)?;

    if !matches!(meta.get("directed"), Some(Value::Bool(_))) {
        return Err(SchemaViolation::DirectedNotBoolean);
    }

    let mut ids: HashSet<&str> = HashSet::with_capacity(nodes.len());
    for node in nodes {
        check_node(node, &mut ids)?;
    }
    for edge in edges {
        check_edge(edge, &ids)?;
    }

    Ok(())
}

fn check_node<'a>(node: &'a Value, ids: &mut HashSet<&'a str>) -> Result<(), SchemaViolation> {
    let node = node.as_object().ok_or(SchemaViolation::NodeNotObject)?;
    let (Some(id), Some(t)) = (node.get("id"), node.get("t")) else {
        return Err(SchemaViolation::NodeMissingField);
    };

    let id = match id {
        Value::String(s) if !s.is_empty() => s.as_str(),
        _ => return Err(SchemaViolation::NodeIdInvalid),
    };
    if !ids.insert(id) {
        return Err(SchemaViolation::DuplicateNodeId(id.to_string()));
    }

    let node_type = vocab_member::<NodeType>(t)
        .ok_or_else(|| SchemaViolation::NodeTypeNotAllowed(render(t)))?;

    if node.contains_key("text") && node_type != NodeType::Message {
        return Err(SchemaViolation::TextOnNonMessage);
    }
    Ok(())
}

fn check_edge(edge: &Value, ids: &HashSet<&str>) -> Result<(), SchemaViolation> {
    let edge = edge.as_object().ok_or(SchemaViolation::EdgeNotObject)?;
    let (Some(s), Some(t), Some(r)) = (edge.get("s"), edge.get("t"), edge.get("r")) else {
        return Err(SchemaViolation::EdgeMissingField);
    };

    if !resolves(s, ids) {
        return Err(SchemaViolation::UnknownSource(render(s)));
    }
    if !resolves(t, ids) {
        return Err(SchemaViolation::UnknownTarget(render(t)));
    }
    if vocab_member::<Relation>(r).is_none() {
        return Err(SchemaViolation::RelationNotAllowed(render(r)));
    }
    Ok(())
}

fn resolves(v: &Value, ids: &HashSet<&str>) -> bool {
    v.as_str().is_some_and(|s| ids.contains(s))
}

fn vocab_member<T: std::str::FromStr>(v: &Value) -> Option<T> {
    v.as_str().and_then(|s| s.parse().ok())
}

/// Strings render bare; anything else renders as compact JSON.
fn render(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Boolean verdict plus reason, the shape written to reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub valid: bool,
    pub reason: String,
}

impl Verdict {
    pub const OK: &'static str = "ok";

    pub fn of(doc: &Value) -> Self {
        Self::from(validate_graph(doc))
    }
}

impl From<Result<(), SchemaViolation>> for Verdict {
    fn from(result: Result<(), SchemaViolation>) -> Self {
        match result {
            Ok(()) => Verdict {
                valid: true,
                reason: Self::OK.to_string(),
            },
            Err(v) => Verdict {
                valid: false,
                reason: v.to_string(),
            },
        }
    }
}
