//! In-memory price-series cache with a fixed TTL
//!
//! Thread-safe and async-ready. Data is lost on restart, which is fine:
//! the cache only exists to absorb repeated fetches for the same
//! symbol/timeframe within a short window.

use crate::domain::timeframe::Timeframe;
use crate::domain::types::PriceSeries;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Clone)]
pub struct SeriesCache {
    entries: Arc<RwLock<HashMap<String, (PriceSeries, Instant)>>>,
    ttl: Duration,
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    fn key(symbol: &str, timeframe: Timeframe) -> String {
        format!("{}:{}", symbol, timeframe)
    }

    pub async fn get(&self, symbol: &str, timeframe: Timeframe) -> Option<PriceSeries> {
        let entries = self.entries.read().await;
        let (series, stored_at) = entries.get(&Self::key(symbol, timeframe))?;
        if stored_at.elapsed() > self.ttl {
            return None;
        }
        debug!(symbol, %timeframe, "series cache hit");
        Some(series.clone())
    }

    pub async fn insert(&self, symbol: &str, timeframe: Timeframe, series: PriceSeries) {
        let mut entries = self.entries.write().await;
        entries.insert(Self::key(symbol, timeframe), (series, Instant::now()));
    }

    /// Drops every expired entry. Callers decide when housekeeping runs.
    pub async fn evict_expired(&self) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, stored_at)| stored_at.elapsed() <= self.ttl);
    }
}
