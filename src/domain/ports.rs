use crate::domain::timeframe::Timeframe;
use crate::domain::types::PriceSeries;
use anyhow::Result;
use async_trait::async_trait;

/// Port for the external price-history collaborator.
///
/// The engine itself is synchronous; callers fetch the primary and macro
/// series concurrently through this port before invoking it.
#[async_trait]
pub trait HistoricalDataSource: Send + Sync {
    async fn fetch(&self, symbol: &str, timeframe: Timeframe) -> Result<PriceSeries>;
}
