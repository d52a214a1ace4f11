//! CSV-backed historical data source
//!
//! Reads OHLCV bars from `{dir}/{SYMBOL}_{timeframe}.csv`, oldest first.
//! Header: `timestamp,open,high,low,close,volume` (timestamp and open are
//! accepted but unused by the engine). A `CachedSource` wrapper adds the
//! short-TTL series cache in front of any other source.

use crate::domain::ports::HistoricalDataSource;
use crate::domain::timeframe::Timeframe;
use crate::domain::types::PriceSeries;
use crate::infrastructure::cache::SeriesCache;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct BarRecord {
    #[allow(dead_code)]
    timestamp: String,
    #[allow(dead_code)]
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub struct CsvDataSource {
    data_dir: PathBuf,
}

impl CsvDataSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn path_for(&self, symbol: &str, timeframe: Timeframe) -> PathBuf {
        self.data_dir
            .join(format!("{}_{}.csv", symbol.to_uppercase(), timeframe))
    }
}

#[async_trait]
impl HistoricalDataSource for CsvDataSource {
    async fn fetch(&self, symbol: &str, timeframe: Timeframe) -> Result<PriceSeries> {
        let path = self.path_for(symbol, timeframe);
        debug!(symbol, %timeframe, path = %path.display(), "loading bars");

        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        let mut close = Vec::new();
        let mut high = Vec::new();
        let mut low = Vec::new();
        let mut volume = Vec::new();
        for record in reader.deserialize() {
            let bar: BarRecord =
                record.with_context(|| format!("malformed bar in {}", path.display()))?;
            close.push(bar.close);
            high.push(bar.high);
            low.push(bar.low);
            volume.push(bar.volume);
        }

        let series = PriceSeries::new(close, high, low, volume)
            .with_context(|| format!("inconsistent series in {}", path.display()))?;
        Ok(series)
    }
}

/// Caching decorator over any data source.
pub struct CachedSource<S> {
    inner: S,
    cache: SeriesCache,
}

impl<S> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            cache: SeriesCache::new(ttl),
        }
    }
}

#[async_trait]
impl<S: HistoricalDataSource> HistoricalDataSource for CachedSource<S> {
    async fn fetch(&self, symbol: &str, timeframe: Timeframe) -> Result<PriceSeries> {
        if let Some(series) = self.cache.get(symbol, timeframe).await {
            return Ok(series);
        }
        let series = self.inner.fetch(symbol, timeframe).await?;
        self.cache.insert(symbol, timeframe, series.clone()).await;
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(dir: &std::path::Path, name: &str, rows: &[(f64, f64, f64, f64)]) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        writeln!(file, "timestamp,open,high,low,close,volume").unwrap();
        for (i, (high, low, close, volume)) in rows.iter().enumerate() {
            writeln!(
                file,
                "2026-01-{:02}T00:00:00Z,{},{},{},{},{}",
                i + 1,
                close,
                high,
                low,
                close,
                volume
            )
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_fetch_reads_bars_in_order() {
        let dir = std::env::temp_dir().join("trendcast_csv_test");
        std::fs::create_dir_all(&dir).unwrap();
        write_fixture(
            &dir,
            "BTC_4h.csv",
            &[(101.0, 99.0, 100.0, 10.0), (103.0, 100.0, 102.0, 20.0)],
        );

        let source = CsvDataSource::new(&dir);
        let series = source.fetch("btc", Timeframe::FourHour).await.unwrap();
        assert_eq!(series.close, vec![100.0, 102.0]);
        assert_eq!(series.high, vec![101.0, 103.0]);
        assert_eq!(series.volume, vec![10.0, 20.0]);
    }

    #[tokio::test]
    async fn test_fetch_missing_file_errors() {
        let source = CsvDataSource::new(std::env::temp_dir());
        let err = source.fetch("NOPE", Timeframe::OneDay).await.unwrap_err();
        assert!(err.to_string().contains("failed to open"));
    }

    #[tokio::test]
    async fn test_cached_source_serves_from_cache() {
        let dir = std::env::temp_dir().join("trendcast_csv_cache_test");
        std::fs::create_dir_all(&dir).unwrap();
        write_fixture(&dir, "ETH_1h.csv", &[(101.0, 99.0, 100.0, 10.0)]);

        let source = CachedSource::new(CsvDataSource::new(&dir), Duration::from_secs(60));
        let first = source.fetch("ETH", Timeframe::OneHour).await.unwrap();

        // Delete the file; the cached copy must still answer
        std::fs::remove_file(dir.join("ETH_1h.csv")).unwrap();
        let second = source.fetch("ETH", Timeframe::OneHour).await.unwrap();
        assert_eq!(first.close, second.close);
    }
}
