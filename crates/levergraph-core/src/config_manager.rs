use crate::LeverageError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for LeverageError {
    fn from(err: ConfigError) -> Self {
        LeverageError::Config(err.to_string())
    }
}

/// Main configuration for LeverGraph
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LeverGraphConfig {
    /// Graph construction settings
    #[serde(default)]
    pub graph: GraphConfig,

    /// Leverage and intervention analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Minimum cosine similarity for a semantic edge
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Multiplier applied to an existing edge when textual evidence is found
    #[serde(default = "default_textual_boost")]
    pub textual_boost: f64,

    /// Weight of an edge created from textual evidence alone
    #[serde(default = "default_textual_weight")]
    pub textual_default_weight: f64,

    /// Store embedding vectors on nodes so global leverage can be re-scored from the artifact
    #[serde(default = "default_true")]
    pub persist_embeddings: bool,

    /// Directory used when an artifact name is given without a path
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            textual_boost: default_textual_boost(),
            textual_default_weight: default_textual_weight(),
            persist_embeddings: true,
            artifact_dir: default_artifact_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Hop cutoff for simple path enumeration
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,

    /// Levers returned by targeted leverage
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Paths turned into experiments per lever
    #[serde(default = "default_top_paths")]
    pub top_paths: usize,

    /// Stop enumerating simple paths for one pair after this many (None = exhaustive)
    #[serde(default)]
    pub max_paths_per_pair: Option<usize>,

    /// Seed for k-means++ initialisation
    #[serde(default = "default_kmeans_seed")]
    pub kmeans_seed: u64,

    #[serde(default = "default_kmeans_max_iterations")]
    pub kmeans_max_iterations: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_hops: default_max_hops(),
            top_k: default_top_k(),
            top_paths: default_top_paths(),
            max_paths_per_pair: None,
            kmeans_seed: default_kmeans_seed(),
            kmeans_max_iterations: default_kmeans_max_iterations(),
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider: "hashing" or "static"
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Vector dimension for the hashing provider
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// JSON map of term -> vector for the static provider
    #[serde(default)]
    pub vectors_path: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            dimension: default_embedding_dimension(),
            vectors_path: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "json", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_similarity_threshold() -> f64 {
    0.7
}
fn default_textual_boost() -> f64 {
    1.5
}
fn default_textual_weight() -> f64 {
    0.8
}
fn default_true() -> bool {
    true
}
fn default_artifact_dir() -> PathBuf {
    PathBuf::from(".levergraph").join("graphs")
}
fn default_max_hops() -> usize {
    5
}
fn default_top_k() -> usize {
    5
}
fn default_top_paths() -> usize {
    3
}
fn default_kmeans_seed() -> u64 {
    42
}
fn default_kmeans_max_iterations() -> usize {
    300
}
fn default_embedding_provider() -> String {
    "hashing".to_string()
}
fn default_embedding_dimension() -> usize {
    256
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

/// Configuration manager with file, dotenv and environment layering
pub struct ConfigManager {
    config: LeverGraphConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (.levergraph.toml)
    /// 3. Sensible defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_dotenv();

        let (config, config_path) = Self::load_config_file()?;
        Self::finish(config, config_path)
    }

    /// Load from an explicit file, still applying environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::load_dotenv();

        let config = Self::read_toml_file(path)?;
        Self::finish(config, Some(path.to_path_buf()))
    }

    fn finish(
        config: LeverGraphConfig,
        config_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        info!("Configuration loaded");
        if let Some(ref path) = config_path {
            info!("   config file: {}", path.display());
        } else {
            info!("   config file: none (using defaults)");
        }
        info!("   embedding provider: {}", config.embedding.provider);
        info!(
            "   similarity threshold: {}",
            config.graph.similarity_threshold
        );

        Ok(Self {
            config,
            config_path,
        })
    }

    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".levergraph.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .levergraph.env: {}", e);
                }
            }
        }
    }

    /// Search order:
    /// 1. ./.levergraph.toml
    /// 2. ~/.levergraph/config.toml
    /// 3. defaults
    fn load_config_file() -> Result<(LeverGraphConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".levergraph.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".levergraph").join("config.toml");
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((LeverGraphConfig::default(), None))
    }

    fn read_toml_file(path: &Path) -> Result<LeverGraphConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env_overrides(mut config: LeverGraphConfig) -> LeverGraphConfig {
        if let Ok(threshold) = std::env::var("LEVERGRAPH_SIMILARITY_THRESHOLD") {
            if let Ok(t) = threshold.parse() {
                config.graph.similarity_threshold = t;
            }
        }
        if let Ok(dir) = std::env::var("LEVERGRAPH_ARTIFACT_DIR") {
            config.graph.artifact_dir = PathBuf::from(dir);
        }
        if let Ok(persist) = std::env::var("LEVERGRAPH_PERSIST_EMBEDDINGS") {
            config.graph.persist_embeddings = persist.to_lowercase() == "true" || persist == "1";
        }
        if let Ok(hops) = std::env::var("LEVERGRAPH_MAX_HOPS") {
            if let Ok(h) = hops.parse() {
                config.analysis.max_hops = h;
            }
        }
        if let Ok(budget) = std::env::var("LEVERGRAPH_MAX_PATHS_PER_PAIR") {
            if let Ok(b) = budget.parse() {
                config.analysis.max_paths_per_pair = Some(b);
            }
        }
        if let Ok(provider) = std::env::var("LEVERGRAPH_EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }
        if let Ok(dimension) = std::env::var("LEVERGRAPH_EMBEDDING_DIMENSION") {
            if let Ok(dim) = dimension.parse() {
                config.embedding.dimension = dim;
            }
        }
        if let Ok(path) = std::env::var("LEVERGRAPH_VECTORS_PATH") {
            config.embedding.vectors_path = Some(PathBuf::from(path));
        }
        if let Ok(format) = std::env::var("LEVERGRAPH_LOG_FORMAT") {
            config.logging.format = format;
        }

        config
    }

    fn validate_config(config: &LeverGraphConfig) -> Result<(), ConfigError> {
        let threshold = config.graph.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::ValidationError(format!(
                "similarity_threshold must be in [0, 1], got {}",
                threshold
            )));
        }

        if config.graph.textual_boost < 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "textual_boost must be >= 1.0, got {}",
                config.graph.textual_boost
            )));
        }

        let weight = config.graph.textual_default_weight;
        if !(weight > 0.0 && weight <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "textual_default_weight must be in (0, 1], got {}",
                weight
            )));
        }

        if config.analysis.max_hops == 0 {
            return Err(ConfigError::ValidationError(
                "max_hops must be at least 1".to_string(),
            ));
        }

        match config.embedding.provider.as_str() {
            "hashing" => {
                if config.embedding.dimension == 0 {
                    return Err(ConfigError::ValidationError(
                        "embedding dimension must be positive".to_string(),
                    ));
                }
            }
            "static" => {
                if config.embedding.vectors_path.is_none() {
                    return Err(ConfigError::ValidationError(
                        "static embedding provider requires vectors_path".to_string(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid embedding provider: {}. Must be one of: hashing, static",
                    other
                )))
            }
        }

        match config.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    other
                )))
            }
        }

        match config.logging.format.as_str() {
            "pretty" | "json" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, json, compact",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Wrap an already-built configuration, validating it.
    pub fn from_config(config: LeverGraphConfig) -> Result<Self, ConfigError> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    pub fn config(&self) -> &LeverGraphConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Create a default config file
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let config = LeverGraphConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Ok(())
    }
}
