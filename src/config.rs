use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub kbeval: KbevalConfig,
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub evaluation: EvalConfig,
}

/// kbeval-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KbevalConfig {
    /// Directory where batch runs write their JSON artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Judge transport (Ollama chat) configuration. The model name lives in [`EvalConfig`].
#[derive(Debug, Clone, Deserialize)]
pub struct JudgeConfig {
    #[serde(default = "default_ollama_host")]
    pub host: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound on judge calls in flight across all scorers.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            timeout_secs: default_timeout_secs(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Answer generation configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationConfig {
    /// Falls back to `evaluation.judge_model` when unset.
    #[serde(default)]
    pub model: Option<String>,
}

/// Embeddings configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_embeddings_base_url")]
    pub base_url: String,
    #[serde(default = "default_embeddings_model")]
    pub model: String,
    /// Name of the env var holding the API key; local endpoints need none.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            base_url: default_embeddings_base_url(),
            model: default_embeddings_model(),
            api_key_env: None,
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Vector search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            qdrant_url: default_qdrant_url(),
            collection: default_collection(),
            top_k: default_top_k(),
        }
    }
}

/// Scoring policy handed to the metrics aggregator.
///
/// The weights are fixed policy constants: completeness counts most, relevancy
/// second, faithfulness and precision equally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    #[serde(default = "default_model")]
    pub judge_model: String,
    #[serde(default = "default_relevancy_weight")]
    pub relevancy_weight: f64,
    #[serde(default = "default_completeness_weight")]
    pub completeness_weight: f64,
    #[serde(default = "default_faithfulness_weight")]
    pub faithfulness_weight: f64,
    #[serde(default = "default_precision_weight")]
    pub precision_weight: f64,
    /// k used by precision-at-k.
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            judge_model: default_model(),
            relevancy_weight: default_relevancy_weight(),
            completeness_weight: default_completeness_weight(),
            faithfulness_weight: default_faithfulness_weight(),
            precision_weight: default_precision_weight(),
            default_top_k: default_top_k(),
        }
    }
}

impl EvalConfig {
    /// Check the weights form a convex combination and k is usable.
    pub fn validate(&self) -> crate::error::Result<()> {
        let weights = [
            self.relevancy_weight,
            self.completeness_weight,
            self.faithfulness_weight,
            self.precision_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(crate::error::KbEvalError::Config(
                "evaluation weights must be finite and non-negative".to_string(),
            ));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(crate::error::KbEvalError::Config(format!(
                "evaluation weights must sum to 1.0 (got {:.4})",
                sum
            )));
        }
        if self.default_top_k == 0 {
            return Err(crate::error::KbEvalError::Config(
                "evaluation.default_top_k must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("eval_runs")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrency() -> usize {
    4
}

fn default_embeddings_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_embeddings_model() -> String {
    "bge-small-en-v1.5".to_string()
}

fn default_cache_capacity() -> usize {
    256
}

fn default_qdrant_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_collection() -> String {
    "infra_kb".to_string()
}

fn default_top_k() -> usize {
    3
}

fn default_relevancy_weight() -> f64 {
    0.25
}

fn default_completeness_weight() -> f64 {
    0.35
}

fn default_faithfulness_weight() -> f64 {
    0.20
}

fn default_precision_weight() -> f64 {
    0.20
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in KBEVAL_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("KBEVAL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str).context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.judge.timeout_secs == 0 {
            anyhow::bail!("judge.timeout_secs must be greater than 0");
        }

        if self.judge.max_concurrency == 0 {
            anyhow::bail!("judge.max_concurrency must be greater than 0");
        }

        if self.retrieval.top_k == 0 {
            anyhow::bail!("retrieval.top_k must be greater than 0");
        }

        if let Some(ref key_env) = self.embeddings.api_key_env {
            std::env::var(key_env).with_context(|| {
                format!(
                    "Environment variable {} not set. Set it in your .env file or as an environment variable.",
                    key_env
                )
            })?;
        }

        self.evaluation.validate()?;

        Ok(())
    }

    /// Directory for batch run artifacts
    pub fn output_dir(&self) -> &Path {
        &self.kbeval.output_dir
    }

    /// Model used for answer generation
    pub fn generation_model(&self) -> &str {
        self.generation
            .model
            .as_deref()
            .unwrap_or(&self.evaluation.judge_model)
    }

    /// Embeddings API key, when one is configured
    pub fn embeddings_api_key(&self) -> Option<String> {
        self.embeddings
            .api_key_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
    }
}
