//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/criticat/config.toml`, or from
//! an explicit path passed on the command line.
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/criticat/` (~/.config/criticat/)
//! - State/Logs: `$XDG_STATE_HOME/criticat/` (~/.local/state/criticat/)
//!
//! Corpus and output paths are relative to the working directory unless
//! given as absolute paths, matching how the research scripts are run from
//! the project root.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Metrics computed when the config file does not say otherwise.
const DEFAULT_ENABLED_METRICS: &[&str] = &[
    "num_turns",
    "num_student_messages",
    "num_ai_messages",
    "avg_tokens_student",
    "avg_tokens_ai",
    "num_ai_questions",
    "exploration_ratio_ai",
];

/// Main configuration struct
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Corpus root: one sub-folder per conversation
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// Output table locations
    #[serde(default)]
    pub outputs: OutputsConfig,

    /// Metric name -> enabled
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: BTreeMap<String, bool>,

    /// Embedding provider for semantic metrics
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Semantic displacement tables
    #[serde(default)]
    pub divergence: DivergenceConfig,

    /// Plain-text dialogue export
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            outputs: OutputsConfig::default(),
            metrics_enabled: default_metrics_enabled(),
            embedding: EmbeddingConfig::default(),
            divergence: DivergenceConfig::default(),
            export: ExportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_metrics_enabled() -> BTreeMap<String, bool> {
    DEFAULT_ENABLED_METRICS
        .iter()
        .map(|name| (name.to_string(), true))
        .collect()
}

/// Output CSV paths
#[derive(Debug, Deserialize, Clone)]
pub struct OutputsConfig {
    #[serde(default = "default_long_csv")]
    pub metrics_long_csv: PathBuf,

    #[serde(default = "default_stats_csv")]
    pub metrics_stats_csv: PathBuf,

    #[serde(default = "default_wide_csv")]
    pub metrics_wide_csv: PathBuf,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            metrics_long_csv: default_long_csv(),
            metrics_stats_csv: default_stats_csv(),
            metrics_wide_csv: default_wide_csv(),
        }
    }
}

impl OutputsConfig {
    /// Same file names, relocated under `dir`.
    pub fn relocated(&self, dir: &Path) -> Self {
        let rebase = |p: &Path| dir.join(p.file_name().unwrap_or(p.as_os_str()));
        Self {
            metrics_long_csv: rebase(&self.metrics_long_csv),
            metrics_stats_csv: rebase(&self.metrics_stats_csv),
            metrics_wide_csv: rebase(&self.metrics_wide_csv),
        }
    }
}

fn default_long_csv() -> PathBuf {
    PathBuf::from("metrics_output/metrics_raw.csv")
}

fn default_stats_csv() -> PathBuf {
    PathBuf::from("metrics_output/metrics_stats.csv")
}

fn default_wide_csv() -> PathBuf {
    PathBuf::from("metrics_output/metrics_wide.csv")
}

/// Supported embedding providers
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Local feature-hashing embedder; lexical overlap only, for tests and offline runs
    Hashing,
    /// Ollama server embeddings (default)
    Ollama,
    /// No embedder; semantic metrics fail
    None,
}

impl EmbeddingProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingProviderKind::Hashing => "hashing",
            EmbeddingProviderKind::Ollama => "ollama",
            EmbeddingProviderKind::None => "none",
        }
    }
}

/// Embedding provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: EmbeddingProviderKind,

    /// Vector size for the hashing provider
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Ollama base URL
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    /// Ollama embedding model
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            dimension: default_embedding_dimension(),
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

fn default_embedding_provider() -> EmbeddingProviderKind {
    EmbeddingProviderKind::Ollama
}

fn default_embedding_dimension() -> usize {
    384
}

fn default_embedding_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_timeout() -> u64 {
    600
}

/// Semantic displacement table configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DivergenceConfig {
    /// Distances at or below these count as aligned
    #[serde(default = "default_divergence_thresholds")]
    pub thresholds: Vec<f64>,

    #[serde(default = "default_divergence_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for DivergenceConfig {
    fn default() -> Self {
        Self {
            thresholds: default_divergence_thresholds(),
            output_dir: default_divergence_output_dir(),
        }
    }
}

fn default_divergence_thresholds() -> Vec<f64> {
    vec![0.25, 0.35, 0.60]
}

fn default_divergence_output_dir() -> PathBuf {
    PathBuf::from("figures/semantic_divergence")
}

/// Dialogue export configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_export_output_root")]
    pub output_root: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_root: default_export_output_root(),
        }
    }
}

fn default_export_output_root() -> PathBuf {
    PathBuf::from("dialogues")
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load from `path` when given, otherwise from the default location.
    pub fn load_or_default_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.embedding.provider == EmbeddingProviderKind::Hashing && self.embedding.dimension == 0
        {
            return Err(Error::Config(
                "embedding.dimension must be positive for the hashing provider".to_string(),
            ));
        }
        if let Some(bad) = self
            .divergence
            .thresholds
            .iter()
            .find(|t| !(0.0..=2.0).contains(*t))
        {
            return Err(Error::Config(format!(
                "divergence.thresholds must lie in [0, 2], got {}",
                bad
            )));
        }
        Ok(())
    }

    /// Names of metrics switched on, in name order.
    pub fn enabled_metric_names(&self) -> Vec<&str> {
        self.metrics_enabled
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/criticat/config.toml` (~/.config/criticat/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("criticat").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/criticat/` (~/.local/state/criticat/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("criticat")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data_root, PathBuf::from("data"));
        assert_eq!(config.enabled_metric_names().len(), 7);
        assert_eq!(config.metrics_enabled.get("num_turns"), Some(&true));
        assert_eq!(config.metrics_enabled.get("semantic_divergence"), None);
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Ollama);
        assert_eq!(config.divergence.thresholds, vec![0.25, 0.35, 0.60]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
data_root = "corpus"

[outputs]
metrics_long_csv = "out/long.csv"

[metrics_enabled]
num_turns = true
semantic_divergence = true
avg_tokens_ai = false

[embedding]
provider = "ollama"
model = "bge-m3"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.data_root, PathBuf::from("corpus"));
        assert_eq!(config.outputs.metrics_long_csv, PathBuf::from("out/long.csv"));
        assert_eq!(
            config.outputs.metrics_wide_csv,
            PathBuf::from("metrics_output/metrics_wide.csv")
        );
        assert_eq!(
            config.enabled_metric_names(),
            vec!["num_turns", "semantic_divergence"]
        );
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Ollama);
        assert_eq!(config.embedding.model, "bge-m3");
        assert_eq!(config.embedding.endpoint, "http://localhost:11434");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let mut config = Config::default();
        config.divergence.thresholds = vec![0.25, 3.0];
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_outputs_relocated() {
        let outputs = OutputsConfig::default().relocated(Path::new("/tmp/run"));
        assert_eq!(
            outputs.metrics_long_csv,
            PathBuf::from("/tmp/run/metrics_raw.csv")
        );
        assert_eq!(
            outputs.metrics_stats_csv,
            PathBuf::from("/tmp/run/metrics_stats.csv")
        );
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[metrics_enabled]\nnum_turns = true\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.enabled_metric_names(), vec!["num_turns"]);

        std::fs::write(&path, "data_root = [").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
