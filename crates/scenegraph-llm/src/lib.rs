//! Graph generation backends.
//!
//! The text-generation service is untrusted and out of our control: it gets
//! a fixed system instruction plus one JSON payload and returns raw text.
//! Everything that decides whether that text is a usable graph lives in
//! `scenegraph-schema`; this crate only moves bytes.
//!
//! ```text
//!   record ──► ScenePayload ──► [system, user] ──► GraphGenerator ──► raw text
//! ```
//!
//! Backends:
//! - `OllamaClient` (feature `ollama`): blocking HTTP to a local Ollama server
//! - `MockGenerator`: deterministic, offline; derives a graph from the payload

pub mod config;
pub mod mock;
#[cfg(feature = "ollama")]
pub mod ollama;
pub mod payload;
pub mod prompt;

use serde::{Deserialize, Serialize};

pub use config::{ConfigError, OllamaApi, OllamaConfig};
pub use mock::MockGenerator;
#[cfg(feature = "ollama")]
pub use ollama::OllamaClient;
pub use payload::ScenePayload;
pub use prompt::{graph_request, render_transcript, GRAPH_SYSTEM_PROMPT};

/// Default output budget for one graph.
pub const DEFAULT_MAX_TOKENS: u32 = 700;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },
    #[error("network error: {0}")]
    Network(String),
    #[error("http error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A text-generation backend: role-tagged turns in, raw text out.
///
/// Calls block until the backend answers or fails. There is no retry here;
/// callers treat any error as fatal for the batch.
pub trait GraphGenerator {
    fn generate(&self, messages: &[Message], max_tokens: u32) -> Result<String, GenerateError>;

    /// Short human-readable description for logs (`ollama(llama3.1:8b)`).
    fn describe(&self) -> String;
}
