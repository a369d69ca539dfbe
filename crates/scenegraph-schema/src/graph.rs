//! Typed view of an accepted graph.
//!
//! Outcome records carry the parsed document verbatim; this typed form is
//! what in-process consumers (summaries, the mock backend) work with. It only
//! keeps the attributes the schema defines, so extra node or edge keys are
//! dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::validate::{validate_graph, SchemaViolation};
use crate::vocab::{NodeType, Relation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub meta: Meta,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub directed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub t: NodeType,
    /// Only present on `message` nodes. The schema does not constrain its
    /// JSON type, so it stays untyped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub s: String,
    pub t: String,
    pub r: Relation,
}

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("{0}")]
    Schema(#[from] SchemaViolation),
    #[error("failed to decode validated graph: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Graph {
    /// Validate `doc` and decode it into the typed form.
    pub fn from_document(doc: &Value) -> Result<Self, GraphError> {
        validate_graph(doc)?;
        Ok(serde_json::from_value(doc.clone())?)
    }

    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn summary(&self) -> GraphSummary {
        let mut node_types = BTreeMap::new();
        for n in &self.nodes {
            *node_types.entry(n.t).or_insert(0) += 1;
        }
        let mut relations = BTreeMap::new();
        for e in &self.edges {
            *relations.entry(e.r).or_insert(0) += 1;
        }
        GraphSummary {
            directed: self.meta.directed,
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            node_types,
            relations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub directed: bool,
    pub nodes: usize,
    pub edges: usize,
    pub node_types: BTreeMap<NodeType, usize>,
    pub relations: BTreeMap<Relation, usize>,
}
