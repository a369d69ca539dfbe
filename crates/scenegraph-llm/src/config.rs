//! Backend configuration resolved from the environment.
//!
//! Precedence for every setting: explicit override (CLI flag) → env var →
//! built-in default. Malformed env values are errors, not silent defaults.

use std::str::FromStr;
use std::time::Duration;

pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";
pub const SCENEGRAPH_MODEL_ENV: &str = "SCENEGRAPH_MODEL";
pub const SCENEGRAPH_TEMPERATURE_ENV: &str = "SCENEGRAPH_TEMPERATURE";
pub const SCENEGRAPH_TOP_P_ENV: &str = "SCENEGRAPH_TOP_P";
pub const SCENEGRAPH_LLM_TIMEOUT_SECS_ENV: &str = "SCENEGRAPH_LLM_TIMEOUT_SECS";

// Prefer IPv4 loopback: `localhost` may resolve to ::1 while Ollama only
// listens on 127.0.0.1.
const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1:11434";
const DEFAULT_MODEL: &str = "llama3.1:8b";
const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_TOP_P: f32 = 0.9;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {name}={value:?} (expected {expected})")]
    InvalidValue {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read {name}: {reason}")]
    Unreadable { name: &'static str, reason: String },
}

/// Which Ollama endpoint to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OllamaApi {
    /// `/api/generate` with the turns flattened into one prompt.
    #[default]
    Generate,
    /// `/api/chat` with role-tagged messages.
    Chat,
}

impl FromStr for OllamaApi {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generate" => Ok(OllamaApi::Generate),
            "chat" => Ok(OllamaApi::Chat),
            other => Err(ConfigError::InvalidValue {
                name: "ollama api",
                value: other.to_string(),
                expected: "`generate` or `chat`",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub api: OllamaApi,
    pub temperature: f32,
    pub top_p: f32,
    /// `None` disables the timeout.
    pub timeout: Option<Duration>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api: OllamaApi::default(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            timeout: Some(Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS)),
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name))
    }

    /// Resolve settings through `lookup` (the process env in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let defaults = Self::default();
        let host = read_var(&lookup, OLLAMA_HOST_ENV)?
            .map(|h| normalize_host(&h))
            .unwrap_or(defaults.host);
        let model = read_var(&lookup, SCENEGRAPH_MODEL_ENV)?.unwrap_or(defaults.model);
        let temperature = parse_var(&lookup, SCENEGRAPH_TEMPERATURE_ENV, "a number")?
            .unwrap_or(defaults.temperature);
        let top_p =
            parse_var(&lookup, SCENEGRAPH_TOP_P_ENV, "a number")?.unwrap_or(defaults.top_p);
        let timeout = match parse_var::<u64, _>(
            &lookup,
            SCENEGRAPH_LLM_TIMEOUT_SECS_ENV,
            "integer seconds; 0 disables",
        )? {
            Some(secs) => timeout_from_secs(secs),
            None => defaults.timeout,
        };

        Ok(Self {
            host,
            model,
            api: defaults.api,
            temperature,
            top_p,
            timeout,
        })
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = normalize_host(host);
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = timeout_from_secs(secs);
        self
    }
}

pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs != 0).then(|| Duration::from_secs(secs))
}

/// Add a scheme when missing and drop trailing slashes; empty means default.
pub fn normalize_host(host: &str) -> String {
    let mut host = host.trim().to_string();
    if host.is_empty() {
        host = DEFAULT_OLLAMA_HOST.to_string();
    }
    if !host.starts_with("http://") && !host.starts_with("https://") {
        host = format!("http://{host}");
    }
    host.trim_end_matches('/').to_string()
}

/// Empty (whitespace-only) values count as unset.
fn read_var<F>(lookup: &F, name: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    match lookup(name) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v.trim().to_string())),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::Unreadable {
            name,
            reason: e.to_string(),
        }),
    }
}

fn parse_var<T, F>(
    lookup: &F,
    name: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let Some(raw) = read_var(lookup, name)? else {
        return Ok(None);
    };
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue {
            name,
            value: raw,
            expected,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env::VarError;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, VarError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn defaults_when_env_is_empty() {
        let cfg = OllamaConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg, OllamaConfig::default());
        assert_eq!(cfg.timeout, Some(Duration::from_secs(300)));
    }

    #[test]
    fn env_overrides_are_parsed() {
        let cfg = OllamaConfig::from_lookup(lookup_from(&[
            (OLLAMA_HOST_ENV, "gpu-box:11434/"),
            (SCENEGRAPH_MODEL_ENV, "mistral"),
            (SCENEGRAPH_TEMPERATURE_ENV, "0.7"),
            (SCENEGRAPH_LLM_TIMEOUT_SECS_ENV, "0"),
        ]))
        .unwrap();
        assert_eq!(cfg.host, "http://gpu-box:11434");
        assert_eq!(cfg.model, "mistral");
        assert!((cfg.temperature - 0.7).abs() < f32::EPSILON);
        assert!((cfg.top_p - 0.9).abs() < f32::EPSILON);
        assert_eq!(cfg.timeout, None);
    }

    #[test]
    fn malformed_numbers_are_errors() {
        let err = OllamaConfig::from_lookup(lookup_from(&[(SCENEGRAPH_TOP_P_ENV, "high")]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid SCENEGRAPH_TOP_P=\"high\" (expected a number)"
        );
    }

    #[test]
    fn host_normalization() {
        assert_eq!(normalize_host(""), "http://127.0.0.1:11434");
        assert_eq!(normalize_host("https://llm.internal/"), "https://llm.internal");
        assert_eq!(normalize_host(" 10.0.0.2:11434 "), "http://10.0.0.2:11434");
    }

    #[test]
    fn api_names() {
        assert_eq!("chat".parse::<OllamaApi>().unwrap(), OllamaApi::Chat);
        assert_eq!("Generate".parse::<OllamaApi>().unwrap(), OllamaApi::Generate);
        assert!("completions".parse::<OllamaApi>().is_err());
    }
}
