//! Closed vocabularies for node types (`t`) and edge relations (`r`).
//!
//! Names are case-sensitive and match the wire format exactly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Player,
    Character,
    Event,
    Message,
    Team,
}

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Player,
        NodeType::Character,
        NodeType::Event,
        NodeType::Message,
        NodeType::Team,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Player => "player",
            NodeType::Character => "character",
            NodeType::Event => "event",
            NodeType::Message => "message",
            NodeType::Team => "team",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Sent,
    Targets,
    RepliedTo,
    SameTeam,
    Controls,
    ParticipatedIn,
    OccurredNear,
    PriorConflict,
    PriorAffiliation,
}

impl Relation {
    pub const ALL: [Relation; 9] = [
        Relation::Sent,
        Relation::Targets,
        Relation::RepliedTo,
        Relation::SameTeam,
        Relation::Controls,
        Relation::ParticipatedIn,
        Relation::OccurredNear,
        Relation::PriorConflict,
        Relation::PriorAffiliation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Sent => "sent",
            Relation::Targets => "targets",
            Relation::RepliedTo => "replied_to",
            Relation::SameTeam => "same_team",
            Relation::Controls => "controls",
            Relation::ParticipatedIn => "participated_in",
            Relation::OccurredNear => "occurred_near",
            Relation::PriorConflict => "prior_conflict",
            Relation::PriorAffiliation => "prior_affiliation",
        }
    }
}

/// Relations the generation prompt advertises but the validator rejects.
///
/// Known inconsistency: a backend that follows the prompt and emits `is` or
/// `caused` produces a graph that always fails validation. Kept as-is until
/// the two vocabularies are reconciled on purpose.
pub const PROMPT_ONLY_RELATIONS: [&str; 2] = ["is", "caused"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVocabulary {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for NodeType {
    type Err = UnknownVocabulary;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownVocabulary {
                kind: "node type",
                value: s.to_string(),
            })
    }
}

impl FromStr for Relation {
    type Err = UnknownVocabulary;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relation::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownVocabulary {
                kind: "relation",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
