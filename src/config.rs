use crate::application::combiner::EnsembleWeights;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Wall-clock budget per estimator before it is dropped from the
    /// ensemble.
    pub per_estimator_timeout_ms: u64,
    /// Overall budget for one valuation request.
    pub request_deadline_ms: u64,
    /// Serve the rule-based estimate when every trained estimator is
    /// unavailable, instead of failing the request.
    pub rule_fallback_enabled: bool,
    pub ensemble_weights: EnsembleWeights,
    /// z-value for the confidence interval (1.96 for 95%).
    pub interval_z: f64,
    pub min_comparable_similarity: f64,
    pub max_comparables: usize,
    pub market_cache_ttl_ms: u64,
    pub model_dir: PathBuf,
    // Collaborator endpoints; each is optional and the engine degrades
    // gracefully when unset.
    pub market_data_url: Option<String>,
    pub comparables_url: Option<String>,
    pub oracle_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            per_estimator_timeout_ms: 2_000,
            request_deadline_ms: 5_000,
            rule_fallback_enabled: true,
            ensemble_weights: EnsembleWeights::default(),
            interval_z: 1.96,
            min_comparable_similarity: 0.3,
            max_comparables: 10,
            market_cache_ttl_ms: 60_000,
            model_dir: PathBuf::from("models"),
            market_data_url: None,
            comparables_url: None,
            oracle_url: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let per_estimator_timeout_ms = env::var("PER_ESTIMATOR_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse::<u64>()
            .context("Failed to parse PER_ESTIMATOR_TIMEOUT_MS")?;

        let request_deadline_ms = env::var("REQUEST_DEADLINE_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u64>()
            .context("Failed to parse REQUEST_DEADLINE_MS")?;

        let rule_fallback_enabled = env::var("RULE_FALLBACK_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);

        let neural = env::var("WEIGHT_NEURAL")
            .unwrap_or_else(|_| "0.5".to_string())
            .parse::<f64>()
            .context("Failed to parse WEIGHT_NEURAL")?;
        let bagged_tree = env::var("WEIGHT_BAGGED_TREE")
            .unwrap_or_else(|_| "0.3".to_string())
            .parse::<f64>()
            .context("Failed to parse WEIGHT_BAGGED_TREE")?;
        let boosted_tree = env::var("WEIGHT_BOOSTED_TREE")
            .unwrap_or_else(|_| "0.2".to_string())
            .parse::<f64>()
            .context("Failed to parse WEIGHT_BOOSTED_TREE")?;

        let interval_z = env::var("INTERVAL_Z")
            .unwrap_or_else(|_| "1.96".to_string())
            .parse::<f64>()
            .context("Failed to parse INTERVAL_Z")?;

        let min_comparable_similarity = env::var("MIN_COMPARABLE_SIMILARITY")
            .unwrap_or_else(|_| "0.3".to_string())
            .parse::<f64>()
            .context("Failed to parse MIN_COMPARABLE_SIMILARITY")?;

        let max_comparables = env::var("MAX_COMPARABLES")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<usize>()
            .context("Failed to parse MAX_COMPARABLES")?;

        let market_cache_ttl_ms = env::var("MARKET_CACHE_TTL_MS")
            .unwrap_or_else(|_| "60000".to_string())
            .parse::<u64>()
            .context("Failed to parse MARKET_CACHE_TTL_MS")?;

        let model_dir = env::var("MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_dir);

        Ok(Config {
            per_estimator_timeout_ms,
            request_deadline_ms,
            rule_fallback_enabled,
            ensemble_weights: EnsembleWeights { neural, bagged_tree, boosted_tree },
            interval_z,
            min_comparable_similarity,
            max_comparables,
            market_cache_ttl_ms,
            model_dir,
            market_data_url: env::var("MARKET_DATA_URL").ok(),
            comparables_url: env::var("COMPARABLES_URL").ok(),
            oracle_url: env::var("ORACLE_URL").ok(),
        })
    }
}
