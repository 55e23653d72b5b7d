//! Configuration management for the Mes Droits assistant.
//!
//! Configuration is merged from several sources, later sources winning:
//! built-in defaults, a YAML config file, `MES_DROITS_*` environment
//! variables, then command-line flags (applied via [`AppConfig::with_overrides`]).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Default Ollama endpoint for both chat and embeddings.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the publication vector store
    pub store_path: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Chat provider ("ollama", "mock")
    pub provider: String,

    /// Chat provider endpoint
    pub endpoint: String,

    /// Chat model identifier
    pub model: String,

    /// Embedding provider ("ollama", "mock")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Embedding vector dimension
    pub embedding_dim: usize,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Config file structure (`mes-droits.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    store: Option<StoreConfig>,
    llm: Option<LlmSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    endpoint: Option<String>,
    model: Option<String>,
    #[serde(rename = "embeddingProvider")]
    embedding_provider: Option<String>,
    #[serde(rename = "embeddingModel")]
    embedding_model: Option<String>,
    #[serde(rename = "embeddingDim")]
    embedding_dim: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("publications.lancedb"),
            config_file: None,
            provider: "ollama".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: "llama3.2".to_string(),
            embedding_provider: "ollama".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dim: 768,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `MES_DROITS_CONFIG`: Path to config file
    /// - `MES_DROITS_STORE`: Vector store directory
    /// - `MES_DROITS_ENDPOINT`: Chat/embedding endpoint
    /// - `MES_DROITS_MODEL`: Chat model identifier
    /// - `MES_DROITS_EMBEDDING_MODEL`: Embedding model identifier
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(config_file) = std::env::var("MES_DROITS_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("mes-droits.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override the config file
        if let Ok(store) = std::env::var("MES_DROITS_STORE") {
            config.store_path = PathBuf::from(store);
        }

        if let Ok(endpoint) = std::env::var("MES_DROITS_ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Ok(model) = std::env::var("MES_DROITS_MODEL") {
            config.model = model;
        }

        if let Ok(model) = std::env::var("MES_DROITS_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }

        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(store) = config_file.store {
            if let Some(path) = store.path {
                result.store_path = PathBuf::from(path);
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(endpoint) = llm.endpoint {
                result.endpoint = endpoint;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if let Some(provider) = llm.embedding_provider {
                result.embedding_provider = provider;
            }
            if let Some(model) = llm.embedding_model {
                result.embedding_model = model;
            }
            if let Some(dim) = llm.embedding_dim {
                result.embedding_dim = dim;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        store_path: Option<PathBuf>,
        config_file: Option<PathBuf>,
        endpoint: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(store_path) = store_path {
            self.store_path = store_path;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate configuration for the active providers.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["ollama", "mock"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if !known_providers.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                known_providers.join(", ")
            )));
        }

        if self.embedding_dim == 0 {
            return Err(AppError::Config(
                "Embedding dimension must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.embedding_dim, 768);
        assert!(!config.verbose);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some(PathBuf::from("/tmp/store")),
            None,
            Some("http://localhost:8080".to_string()),
            Some("mistral".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.store_path, PathBuf::from("/tmp/store"));
        assert_eq!(overridden.endpoint, "http://localhost:8080");
        assert_eq!(overridden.model, "mistral");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mes-droits.yaml");
        std::fs::write(
            &path,
            "store:\n  path: /data/pubs\nllm:\n  model: mistral\n  embeddingDim: 384\nlogging:\n  level: debug\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        let merged = config.merge_yaml(&path).unwrap();

        assert_eq!(merged.store_path, PathBuf::from("/data/pubs"));
        assert_eq!(merged.model, "mistral");
        assert_eq!(merged.embedding_dim, 384);
        assert_eq!(merged.log_level, Some("debug".to_string()));
        // Unset keys keep their defaults
        assert_eq!(merged.embedding_model, "nomic-embed-text");
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_defaults() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }
}
