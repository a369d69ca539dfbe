//! Deterministic offline backend.
//!
//! Reads the payload from the user turn and builds the obvious graph: one
//! player per distinct speaker or target, one message node per chat line,
//! `sent` from speaker to message and `targets` from message to target.
//! Always well-formed, so a dry run exercises the accept path end to end.

use scenegraph_schema::{Edge, Graph, Meta, Node, NodeType, Relation};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::payload::ScenePayload;
use crate::{GenerateError, GraphGenerator, Message, Role};

#[derive(Debug, Clone, Default)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn graph_for(payload: &ScenePayload) -> Graph {
        let mut players: BTreeMap<String, String> = BTreeMap::new();
        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        let mut player_id = |name: &str, nodes: &mut Vec<Node>| -> String {
            if let Some(id) = players.get(name) {
                return id.clone();
            }
            let id = format!("p{}", players.len() + 1);
            players.insert(name.to_string(), id.clone());
            nodes.push(Node {
                id: id.clone(),
                t: NodeType::Player,
                text: None,
            });
            id
        };

        let lines = payload.messages.as_array().map(Vec::as_slice).unwrap_or(&[]);
        for (i, line) in lines.iter().enumerate() {
            let Some(line) = line.as_object() else {
                continue;
            };
            let message_id = format!("m{}", i + 1);
            let speaker = line.get("speaker").and_then(Value::as_str).filter(|s| !s.is_empty());
            let target = line.get("target").and_then(Value::as_str).filter(|s| !s.is_empty());

            let sender = speaker.map(|s| player_id(s, &mut nodes));
            nodes.push(Node {
                id: message_id.clone(),
                t: NodeType::Message,
                text: line.get("text").filter(|t| t.is_string()).cloned(),
            });
            if let Some(sender) = sender {
                edges.push(Edge {
                    s: sender,
                    t: message_id.clone(),
                    r: Relation::Sent,
                });
            }
            if let Some(target) = target {
                let target = player_id(target, &mut nodes);
                edges.push(Edge {
                    s: message_id,
                    t: target,
                    r: Relation::Targets,
                });
            }
        }

        Graph {
            meta: Meta { directed: true },
            nodes,
            edges,
        }
    }
}

impl GraphGenerator for MockGenerator {
    fn generate(&self, messages: &[Message], _max_tokens: u32) -> Result<String, GenerateError> {
        let user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .ok_or_else(|| GenerateError::InvalidRequest("no user turn".to_string()))?;
        let payload: ScenePayload = serde_json::from_str(&user.content).map_err(|e| {
            GenerateError::InvalidRequest(format!("user turn is not a payload: {e}"))
        })?;
        serde_json::to_string(&Self::graph_for(&payload))
            .map_err(|e| GenerateError::InvalidResponse(e.to_string()))
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}
