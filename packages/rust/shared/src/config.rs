//! Application configuration for the market analyst.
//!
//! User config lives at `~/.market-analyst/market-analyst.toml`.
//! CLI flags override config file values, which override defaults.
//! API keys are never written to the file; only the names of the
//! environment variables that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AnalystError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "market-analyst.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".market-analyst";

// ---------------------------------------------------------------------------
// Config structs (matching market-analyst.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Hosted web search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Text-completion and embedding settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Internal nearest-neighbor index settings.
    #[serde(default)]
    pub index: IndexConfig,

    /// HTTP entrypoint settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search endpoint URL.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the search API key.
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Number of results requested per query.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            api_key_env: default_search_key_env(),
            max_results: default_max_results(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://api.tavily.com/search".into()
}
fn default_search_key_env() -> String {
    "TAVILY_API_KEY".into()
}
fn default_max_results() -> u32 {
    3
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the generative language API.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Name of the env var holding the model API key.
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,

    /// Model used for both insight synthesis and SWOT generation.
    #[serde(default = "default_completion_model")]
    pub completion_model: String,

    /// Model used to embed chunks and queries.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key_env: default_llm_key_env(),
            completion_model: default_completion_model(),
            embedding_model: default_embedding_model(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_llm_key_env() -> String {
    "GOOGLE_API_KEY".into()
}
fn default_completion_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_embedding_model() -> String {
    "models/embedding-001".into()
}

/// `[index]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Path of the index database.
    #[serde(default = "default_index_location")]
    pub location: String,

    /// Number of chunks retrieved per query.
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Chunk size in characters used at ingest time.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap in characters between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            location: default_index_location(),
            top_k: default_top_k(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_index_location() -> String {
    "var/index/market-analyst.db".into()
}
fn default_top_k() -> u32 {
    3
}
fn default_chunk_size() -> usize {
    500
}
fn default_chunk_overlap() -> usize {
    100
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}

// ---------------------------------------------------------------------------
// Runtime config (resolved from file + environment)
// ---------------------------------------------------------------------------

/// Runtime configuration injected into the pipeline at construction time.
///
/// Resolved once from [`AppConfig`] plus the environment, so nothing
/// downstream reads environment variables on its own.
#[derive(Clone)]
pub struct AnalystConfig {
    /// Search endpoint.
    pub search_endpoint: Url,
    /// Search API key. `None` is allowed: the web search stage degrades.
    pub search_api_key: Option<String>,
    /// Results requested from the search service.
    pub search_max_results: u32,
    /// Generative API base URL.
    pub llm_base_url: Url,
    /// Generative API key.
    pub llm_api_key: String,
    /// Completion model identifier.
    pub completion_model_id: String,
    /// Embedding model identifier.
    pub embedding_model_id: String,
    /// Index database location.
    pub index_location: PathBuf,
    /// Chunks retrieved per query.
    pub top_k: usize,
}

impl std::fmt::Debug for AnalystConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalystConfig")
            .field("search_endpoint", &self.search_endpoint.as_str())
            .field("search_api_key", &self.search_api_key.as_ref().map(|_| "***"))
            .field("search_max_results", &self.search_max_results)
            .field("llm_base_url", &self.llm_base_url.as_str())
            .field("llm_api_key", &"***")
            .field("completion_model_id", &self.completion_model_id)
            .field("embedding_model_id", &self.embedding_model_id)
            .field("index_location", &self.index_location)
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl AnalystConfig {
    /// Resolve against the process environment.
    pub fn resolve(config: &AppConfig) -> Result<Self> {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    /// Resolve using a custom variable lookup.
    pub fn resolve_with(
        config: &AppConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let search_endpoint = parse_url("search.endpoint", &config.search.endpoint)?;
        let llm_base_url = parse_url("llm.base_url", &config.llm.base_url)?;

        let search_api_key = lookup(&config.search.api_key_env).filter(|k| !k.is_empty());
        if search_api_key.is_none() {
            tracing::warn!(
                var = %config.search.api_key_env,
                "search API key not set, web search will degrade"
            );
        }

        let key_env = &config.llm.api_key_env;
        let llm_api_key = match lookup(key_env) {
            Some(val) if !val.is_empty() => val,
            _ => {
                return Err(AnalystError::config(format!(
                    "model API key not found. Set the {key_env} environment variable."
                )));
            }
        };

        if config.index.top_k == 0 {
            return Err(AnalystError::config("index.top_k must be at least 1"));
        }

        Ok(Self {
            search_endpoint,
            search_api_key,
            search_max_results: config.search.max_results,
            llm_base_url,
            llm_api_key,
            completion_model_id: config.llm.completion_model.clone(),
            embedding_model_id: config.llm.embedding_model.clone(),
            index_location: PathBuf::from(&config.index.location),
            top_k: config.index.top_k as usize,
        })
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| AnalystError::config(format!("invalid {key} '{value}': {e}")))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.market-analyst/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| AnalystError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.market-analyst/market-analyst.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AnalystError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| AnalystError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| AnalystError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| AnalystError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AnalystError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with_keys(name: &str) -> Option<String> {
        match name {
            "TAVILY_API_KEY" => Some("tvly-test".into()),
            "GOOGLE_API_KEY" => Some("g-test".into()),
            _ => None,
        }
    }

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("TAVILY_API_KEY"));
        assert!(toml_str.contains("gemini-2.0-flash"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.search.max_results, 3);
        assert_eq!(parsed.index.top_k, 3);
        assert_eq!(parsed.index.chunk_size, 500);
        assert_eq!(parsed.index.chunk_overlap, 100);
        assert_eq!(parsed.server.port, 8000);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let toml_str = r#"
[llm]
completion_model = "gemini-1.5-pro"

[index]
location = "/tmp/market.db"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.llm.completion_model, "gemini-1.5-pro");
        assert_eq!(config.llm.embedding_model, "models/embedding-001");
        assert_eq!(config.index.location, "/tmp/market.db");
        assert_eq!(config.index.top_k, 3);
    }

    #[test]
    fn resolve_reads_keys() {
        let resolved =
            AnalystConfig::resolve_with(&AppConfig::default(), env_with_keys).expect("resolve");
        assert_eq!(resolved.search_api_key.as_deref(), Some("tvly-test"));
        assert_eq!(resolved.llm_api_key, "g-test");
        assert_eq!(resolved.completion_model_id, "gemini-2.0-flash");
        assert_eq!(resolved.top_k, 3);
    }

    #[test]
    fn missing_search_key_is_not_fatal() {
        let resolved = AnalystConfig::resolve_with(&AppConfig::default(), |name| {
            (name == "GOOGLE_API_KEY").then(|| "g-test".to_string())
        })
        .expect("resolve");
        assert!(resolved.search_api_key.is_none());
    }

    #[test]
    fn missing_model_key_is_fatal() {
        let result = AnalystConfig::resolve_with(&AppConfig::default(), |_| None);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn invalid_endpoint_rejected() {
        let mut config = AppConfig::default();
        config.search.endpoint = "not a url".into();
        let result = AnalystConfig::resolve_with(&config, env_with_keys);
        assert!(result.unwrap_err().to_string().contains("search.endpoint"));
    }

    #[test]
    fn debug_redacts_keys() {
        let resolved =
            AnalystConfig::resolve_with(&AppConfig::default(), env_with_keys).expect("resolve");
        let dbg = format!("{resolved:?}");
        assert!(!dbg.contains("tvly-test"));
        assert!(!dbg.contains("g-test"));
    }
}
