use anyhow::{Context, Result};
use std::env;

/// Engine tunables.
///
/// Only the knobs that are genuinely tunable live here; the consensus
/// weights, bonuses and signal thresholds are behavioural contracts and
/// stay as constants next to the code that applies them.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum bars required in each input series
    pub min_bars: usize,
    /// Number of stumps in the gradient-boost ensemble
    pub num_stumps: usize,
    /// Learning rate recorded on the stump ensemble
    pub learning_rate: f64,
    /// TTL for the injected series cache, in seconds
    pub cache_ttl_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_bars: crate::domain::types::MIN_BARS,
            num_stumps: 10,
            learning_rate: 0.1,
            cache_ttl_secs: 60,
        }
    }
}

impl EngineConfig {
    /// Build config from the environment, falling back to defaults.
    ///
    /// Call `dotenvy::dotenv()` first if a .env file should be honoured.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            min_bars: parse_env("TRENDCAST_MIN_BARS", defaults.min_bars)?,
            num_stumps: parse_env("TRENDCAST_NUM_STUMPS", defaults.num_stumps)?,
            learning_rate: parse_env("TRENDCAST_LEARNING_RATE", defaults.learning_rate)?,
            cache_ttl_secs: parse_env("TRENDCAST_CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: {}", key, raw)),
        Err(_) => Ok(default),
    }
}
