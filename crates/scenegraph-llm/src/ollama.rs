//! Ollama backend (blocking HTTP).
//!
//! `/api/generate` receives the flattened transcript as one prompt;
//! `/api/chat` receives the role-tagged turns. Both run with `stream: false`
//! and map `max_tokens` to Ollama's `num_predict` option.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::{OllamaApi, OllamaConfig};
use crate::prompt::render_transcript;
use crate::{GenerateError, GraphGenerator, Message};

pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, GenerateError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GenerateError::Network(format!("failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn url(&self) -> String {
        match self.config.api {
            OllamaApi::Generate => format!("{}/api/generate", self.config.host),
            OllamaApi::Chat => format!("{}/api/chat", self.config.host),
        }
    }

    fn body(&self, messages: &[Message], max_tokens: u32) -> Value {
        let options = json!({
            "temperature": self.config.temperature,
            "top_p": self.config.top_p,
            "num_predict": max_tokens,
        });
        match self.config.api {
            OllamaApi::Generate => json!({
                "model": self.config.model,
                "prompt": render_transcript(messages),
                "stream": false,
                "options": options,
            }),
            OllamaApi::Chat => json!({
                "model": self.config.model,
                "messages": messages,
                "stream": false,
                "options": options,
            }),
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

impl GraphGenerator for OllamaClient {
    fn generate(&self, messages: &[Message], max_tokens: u32) -> Result<String, GenerateError> {
        let url = self.url();
        let body = self.body(messages, max_tokens);
        tracing::debug!(%url, model = %self.config.model, max_tokens, "ollama request");

        let resp = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_timeout() {
                GenerateError::Timeout {
                    url: url.clone(),
                    secs: self.config.timeout.map(|t| t.as_secs()).unwrap_or(0),
                }
            } else {
                GenerateError::Network(format!(
                    "failed to reach ollama at {url} (is it running?) ({e}). Try: `ollama serve` or set OLLAMA_HOST"
                ))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(GenerateError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = match self.config.api {
            OllamaApi::Generate => {
                let out: GenerateResponse = resp.json().map_err(|e| {
                    GenerateError::InvalidResponse(format!("ollama returned invalid JSON: {e}"))
                })?;
                out.response
            }
            OllamaApi::Chat => {
                let out: ChatResponse = resp.json().map_err(|e| {
                    GenerateError::InvalidResponse(format!("ollama returned invalid JSON: {e}"))
                })?;
                out.message.content
            }
        };
        tracing::debug!(chars = text.len(), "ollama response");
        Ok(text)
    }

    fn describe(&self) -> String {
        format!("ollama({}, {})", self.config.host, self.config.model)
    }
}
