//! Configuration management for the sabaq pipeline.
//!
//! Handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (.sabaq/config.yaml)
//! - Environment variables (SABAQ_*)
//! - Command-line flags
//!
//! The configuration is workspace-centric: all persistent state
//! (vector database, payloads, fallback files) lives under `.sabaq/`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .sabaq/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Embedding settings
    pub embedding: EmbeddingSettings,

    /// Answer generation settings
    pub generation: GenerationSettings,

    /// Worker process settings
    pub workers: WorkerSettings,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider name ("trigram", "ollama", "mock")
    pub provider: String,

    /// Model identifier (used by the ollama provider)
    pub model: String,

    /// Embedding vector dimension
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            // Local-first default: no model download, no network
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
        }
    }
}

/// Answer generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Endpoint of the local LLM runtime the generation worker talks to
    pub endpoint: String,

    /// Model identifier for generation
    pub model: String,

    /// Maximum new tokens per answer
    pub max_new_tokens: u32,

    /// Generation worker timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            max_new_tokens: 256,
            timeout_secs: 60,
        }
    }
}

/// Worker process configuration.
///
/// Vector inserts and answer generation each run in a dedicated OS
/// process so native-library crashes cannot take down the main process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// Explicit path to the vector worker binary.
    /// Defaults to `sabaq-vector-worker` next to the current executable.
    pub vector_worker: Option<PathBuf>,

    /// Explicit path to the generation worker binary.
    /// Defaults to `sabaq-generate-worker` next to the current executable.
    pub generate_worker: Option<PathBuf>,

    /// Vector insert worker timeout in seconds
    #[serde(default = "default_vector_timeout")]
    pub vector_timeout_secs: u64,
}

fn default_vector_timeout() -> u64 {
    120
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            vector_worker: None,
            generate_worker: None,
            vector_timeout_secs: default_vector_timeout(),
        }
    }
}

impl WorkerSettings {
    /// Resolve the vector worker path.
    pub fn vector_worker_path(&self) -> AppResult<PathBuf> {
        match &self.vector_worker {
            Some(path) => Ok(path.clone()),
            None => sibling_binary("sabaq-vector-worker"),
        }
    }

    /// Resolve the generation worker path.
    pub fn generate_worker_path(&self) -> AppResult<PathBuf> {
        match &self.generate_worker {
            Some(path) => Ok(path.clone()),
            None => sibling_binary("sabaq-generate-worker"),
        }
    }
}

/// Locate a worker binary installed next to the current executable.
fn sibling_binary(name: &str) -> AppResult<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| AppError::Config(format!("Cannot locate current executable: {}", e)))?;
    let dir = exe
        .parent()
        .ok_or_else(|| AppError::Config("Executable has no parent directory".to_string()))?;
    Ok(dir.join(name))
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    embedding: Option<EmbeddingSettings>,
    generation: Option<GenerationSettings>,
    workers: Option<WorkerSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            embedding: EmbeddingSettings::default(),
            generation: GenerationSettings::default(),
            workers: WorkerSettings::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `SABAQ_WORKSPACE`: Override workspace path
    /// - `SABAQ_CONFIG`: Path to config file
    /// - `SABAQ_EMBED_PROVIDER`: Embedding provider name
    /// - `SABAQ_GEN_ENDPOINT`: Generation endpoint URL
    /// - `SABAQ_GEN_MODEL`: Generation model identifier
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("SABAQ_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("SABAQ_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join(".sabaq/config.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
            tracing::debug!("Merged configuration from {:?}", config_path);
        }

        // Environment variables override the YAML config
        if let Ok(provider) = std::env::var("SABAQ_EMBED_PROVIDER") {
            config.embedding.provider = provider;
        }

        if let Ok(endpoint) = std::env::var("SABAQ_GEN_ENDPOINT") {
            config.generation.endpoint = endpoint;
        }

        if let Ok(model) = std::env::var("SABAQ_GEN_MODEL") {
            config.generation.model = model;
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

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(generation) = config_file.generation {
            result.generation = generation;
        }

        if let Some(workers) = config_file.workers {
            result.workers = workers;
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
    /// CLI flags take precedence over environment variables and file config.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .sabaq data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.workspace.join(".sabaq")
    }

    /// Get the vector database path.
    pub fn vector_db_path(&self) -> PathBuf {
        self.data_dir().join("vector_db")
    }

    /// Ensure the .sabaq directory exists.
    pub fn ensure_data_dir(&self) -> AppResult<()> {
        let data_dir = self.data_dir();
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .sabaq directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["trigram", "ollama", "mock"];
        if !known_providers.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                known_providers.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimension must be non-zero".to_string(),
            ));
        }

        if self.generation.timeout_secs == 0 || self.workers.vector_timeout_secs == 0 {
            return Err(AppError::Config(
                "Worker timeouts must be non-zero".to_string(),
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
        assert_eq!(config.embedding.provider, "trigram");
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.generation.timeout_secs, 60);
        assert_eq!(config.workers.vector_timeout_secs, 120);
        assert!(!config.verbose);
        assert!(!config.no_color);
    }

    #[test]
    fn test_data_dir() {
        let config = AppConfig::default();
        assert!(config.data_dir().ends_with(".sabaq"));
        assert!(config.vector_db_path().ends_with("vector_db"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(None, None, None, true, true);

        assert!(overridden.verbose);
        assert!(overridden.no_color);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.embedding.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_default_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_yaml() {
        let temp = tempfile::TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");
        std::fs::write(
            &config_path,
            "embedding:\n  provider: mock\n  model: mock-v1\n  dimensions: 64\nlogging:\n  level: debug\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        let merged = config.merge_yaml(&config_path).unwrap();

        assert_eq!(merged.embedding.provider, "mock");
        assert_eq!(merged.embedding.dimensions, 64);
        assert_eq!(merged.log_level, Some("debug".to_string()));
    }
}
