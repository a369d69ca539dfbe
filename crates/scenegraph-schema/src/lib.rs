//! Scene graph schema for generated social-interaction scenarios.
//!
//! Turns untrusted model output into a classified outcome:
//! - `parse`: raw text → JSON document (or nothing)
//! - `validate`: JSON document → first schema violation (or ok)
//! - `outcome`: the one-of-three record written per input line
//!
//! Graphs are never patched: a document is accepted whole or rejected whole.

pub mod graph;
pub mod outcome;
pub mod parse;
pub mod validate;
pub mod vocab;

pub use graph::{Edge, Graph, GraphError, GraphSummary, Meta, Node};
pub use outcome::{Outcome, GRAPH_JSON_PARSE_FAILED, GRAPH_SCHEMA_INVALID};
pub use parse::{parse_response, ParseMode};
pub use validate::{validate_graph, SchemaViolation, Verdict};
pub use vocab::{NodeType, Relation, UnknownVocabulary, PROMPT_ONLY_RELATIONS};
