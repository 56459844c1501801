use crate::error::{ProxyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";

/// Inbound model name → NIM model name. Unlisted names are forwarded unchanged.
const DEFAULT_MODELS: &[(&str, &str)] = &[
    ("gpt-4o", "z-ai/glm5"),
    ("gpt-4", "deepseek-ai/deepseek-v3.1"),
    ("gpt-4-turbo", "moonshotai/kimi-k2.5-v1"),
    ("gpt-4-32k", "qwen/qwen3-235b-a22b"),
    ("gpt-3.5-turbo", "nvidia/llama-3.1-nemotron-ultra-253b-v1"),
    ("claude-3-opus", "qwen/qwen3-coder-480b-a35b-instruct"),
    ("claude-3.5-sonnet", "qwen/qwen3-235b-a22b-instruct"),
    ("claude-3-haiku", "stepfun/stepfun-3.5-flash"),
    ("gemini-exp-1206", "meta/llama-3.1-405b-instruct"),
    ("gemini-2.0-flash", "minimax/minimax-m2.1"),
    ("o1-preview", "deepseek-ai/deepseek-r1"),
    ("o1", "deepseek-ai/deepseek-r1-distill-llama-70b"),
    ("o3-mini", "qwen/qwq-32b-preview"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default = "default_models")]
    pub models: HashMap<String, String>,
    /// Only reported by `/health`; reasoning content is never rewritten.
    #[serde(default)]
    pub show_reasoning: bool,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Whole-request timeout. Unset means the HTTP client default (none).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: None,
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            upstream: UpstreamConfig::default(),
            models: default_models(),
            show_reasoning: false,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    "NIM_API_KEY".to_string()
}

fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024
}

#[must_use]
pub fn default_models() -> HashMap<String, String> {
    DEFAULT_MODELS
        .iter()
        .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
        .collect()
}

impl ProxyConfig {
    /// Load config from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProxyError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Search standard locations for a config file.
    /// Priority: CLI arg > CWD > XDG config > home dir > built-in defaults
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        for candidate in config_search_paths() {
            if candidate.exists() {
                tracing::info!(path = %candidate.display(), "Loading config");
                return Self::load(&candidate);
            }
        }

        tracing::debug!("No config file found, using built-in defaults");
        Ok(Self::default())
    }

    /// Apply `PORT` from the environment, if it parses.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("PORT") {
            match raw.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!(value = %raw, "Ignoring unparseable PORT"),
            }
        }
    }

    /// Read the upstream credential. A missing key is not an error here:
    /// the upstream rejects the call and that rejection reaches the caller.
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.upstream.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }

    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.upstream.base_url.trim_end_matches('/')
        )
    }
}

#[must_use]
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("nim-proxy.toml")];

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        paths.push(PathBuf::from(xdg).join("nim-proxy").join("config.toml"));
    }

    if let Some(home) = home_dir() {
        paths.push(home.join(".config").join("nim-proxy").join("config.toml"));
        paths.push(home.join(".nim-proxy.toml"));
    }

    paths
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ProxyConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.upstream.api_key_env, "NIM_API_KEY");
        assert_eq!(config.models.len(), 13);
        assert_eq!(config.max_body_bytes, 52_428_800);
        assert!(!config.show_reasoning);
        assert!(config.upstream.timeout_secs.is_none());
    }

    #[test]
    fn test_load_config() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
port = 5000
show_reasoning = true

[upstream]
base_url = "http://localhost:9000/v1/"
api_key_env = "MY_NIM_KEY"
timeout_secs = 30

[models]
"gpt-4o" = "meta/llama-3.3-70b-instruct"
"#
        )
        .unwrap();

        let config = ProxyConfig::load(f.path()).unwrap();
        assert_eq!(config.port, 5000);
        assert!(config.show_reasoning);
        assert_eq!(config.upstream.api_key_env, "MY_NIM_KEY");
        assert_eq!(config.upstream.timeout_secs, Some(30));
        assert_eq!(
            config.chat_completions_url(),
            "http://localhost:9000/v1/chat/completions"
        );
        // An explicit [models] table replaces the built-in one.
        assert_eq!(config.models.len(), 1);
        assert_eq!(
            config.models.get("gpt-4o").map(String::as_str),
            Some("meta/llama-3.3-70b-instruct")
        );
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "port = 8080").unwrap();

        let config = ProxyConfig::load(f.path()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.models, default_models());
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = ProxyConfig::load(Path::new("/nonexistent/nim-proxy.toml")).unwrap_err();
        assert!(matches!(err, ProxyError::Config { .. }));
    }

    #[test]
    fn test_default_models_table() {
        let models = default_models();
        assert_eq!(models.get("gpt-4o").map(String::as_str), Some("z-ai/glm5"));
        assert_eq!(
            models.get("o3-mini").map(String::as_str),
            Some("qwen/qwq-32b-preview")
        );
        assert!(models.get("meta/llama-3.1-8b-instruct").is_none());
    }

    #[test]
    fn test_default_chat_completions_url() {
        let config = ProxyConfig::default();
        assert_eq!(
            config.chat_completions_url(),
            "https://integrate.api.nvidia.com/v1/chat/completions"
        );
    }
}
