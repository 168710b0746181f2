//! TOML configuration.
//!
//! Every section has defaults matching a stock local Endee deployment, so
//! the binary runs without a config file. When `--config` is omitted and
//! `./config/endee.toml` does not exist, [`Config::default`] is used.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::SpaceType;

/// Config file consulted when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./config/endee.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Where the vector service lives and how long to wait for it.
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_url")]
    pub url: String,
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: default_remote_url(),
            timeout_secs: default_remote_timeout(),
            health_timeout_secs: default_health_timeout(),
        }
    }
}

fn default_remote_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}
fn default_remote_timeout() -> u64 {
    30
}
fn default_health_timeout() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_name")]
    pub name: String,
    #[serde(default = "default_dim")]
    pub dim: usize,
    #[serde(default)]
    pub space_type: SpaceType,
    /// Storage precision hint forwarded on creation (e.g. `INT8`).
    #[serde(default)]
    pub precision: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: default_index_name(),
            dim: default_dim(),
            space_type: SpaceType::default(),
            precision: None,
        }
    }
}

fn default_index_name() -> String {
    "docs_index".to_string()
}
fn default_dim() -> usize {
    384
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// File extensions eligible for ingestion, without the leading dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    /// Descend into subdirectories of `root`.
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Number of vector records per insert request.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            extensions: default_extensions(),
            exclude_globs: Vec::new(),
            recursive: false,
            follow_symlinks: false,
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("data")
}
fn default_extensions() -> Vec<String> {
    vec!["txt".to_string(), "md".to_string()]
}
fn default_chunk_size() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("id_map.txt")
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_k")]
    pub k: usize,
    /// Characters of content shown per result.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_k() -> usize {
    5
}
fn default_preview_chars() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    30
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Resolve the effective config for a CLI invocation.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_PATH`] is
/// used if present, otherwise built-in defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                load_config(default_path)
            } else {
                tracing::debug!("no config file at {}, using defaults", DEFAULT_CONFIG_PATH);
                let config = Config::default();
                validate(&config)?;
                Ok(config)
            }
        }
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.index.name.trim().is_empty() {
        bail!("index.name must not be empty");
    }

    if config.index.dim == 0 {
        bail!("index.dim must be > 0");
    }

    if config.ingest.chunk_size == 0 {
        bail!("ingest.chunk_size must be > 0");
    }

    if config.ingest.extensions.is_empty() {
        bail!("ingest.extensions must list at least one extension");
    }

    if config.search.k < 1 {
        bail!("search.k must be >= 1");
    }

    if config.embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }

    if let Some(dims) = config.embedding.dims {
        if dims != config.index.dim {
            bail!(
                "embedding.dims ({}) must match index.dim ({})",
                dims,
                config.index.dim
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" | "local" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or local.",
            other
        ),
    }

    if config.embedding.provider == "openai" && config.embedding.model.is_none() {
        bail!("embedding.model must be specified when provider is 'openai'");
    }

    Ok(())
}
