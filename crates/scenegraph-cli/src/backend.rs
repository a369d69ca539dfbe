//! Backend selection for the `graphs` command.

use anyhow::Result;
use clap::{Args, ValueEnum};

#[cfg(feature = "llm-ollama")]
use scenegraph_llm::{OllamaClient, OllamaConfig};
use scenegraph_llm::{GraphGenerator, MockGenerator, OllamaApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Local Ollama server (`OLLAMA_HOST`, default `http://127.0.0.1:11434`).
    Ollama,
    /// Deterministic offline backend; builds the graph from the payload itself.
    Mock,
}

#[derive(Debug, Clone, Args)]
pub struct BackendArgs {
    /// Text-generation backend.
    #[arg(long, value_enum, default_value_t = BackendKind::Ollama)]
    pub backend: BackendKind,
    /// Ollama host (overrides `OLLAMA_HOST`).
    #[arg(long)]
    pub ollama_host: Option<String>,
    /// Ollama endpoint: `generate` (flattened prompt) or `chat`.
    #[arg(long)]
    pub ollama_api: Option<OllamaApi>,
    /// Model name (overrides `SCENEGRAPH_MODEL`).
    #[arg(long)]
    pub model: Option<String>,
    /// Request timeout in seconds, 0 disables (overrides `SCENEGRAPH_LLM_TIMEOUT_SECS`).
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl BackendArgs {
    pub fn build(&self) -> Result<Box<dyn GraphGenerator>> {
        match self.backend {
            BackendKind::Mock => Ok(Box::new(MockGenerator::new())),
            #[cfg(feature = "llm-ollama")]
            BackendKind::Ollama => {
                let mut config = OllamaConfig::from_env()?;
                if let Some(host) = &self.ollama_host {
                    config = config.with_host(host);
                }
                if let Some(api) = self.ollama_api {
                    config.api = api;
                }
                if let Some(model) = &self.model {
                    config.model = model.clone();
                }
                if let Some(secs) = self.timeout_secs {
                    config = config.with_timeout_secs(secs);
                }
                Ok(Box::new(OllamaClient::new(config)?))
            }
            #[cfg(not(feature = "llm-ollama"))]
            BackendKind::Ollama => Err(anyhow::anyhow!(
                "ollama backend is disabled (rebuild with the `llm-ollama` feature or pass `--backend mock`)"
            )),
        }
    }
}
