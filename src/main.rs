use anyhow::Result;
use clap::Parser;
use std::time::Duration;
use tracing::info;
use trendcast::application::engine::{PredictionEngine, PredictionRequest};
use trendcast::config::EngineConfig;
use trendcast::domain::ports::HistoricalDataSource;
use trendcast::domain::timeframe::Timeframe;
use trendcast::domain::types::AssetType;
use trendcast::infrastructure::csv_source::{CachedSource, CsvDataSource};

/// Market prediction from local OHLCV history.
#[derive(Parser, Debug)]
#[command(name = "trendcast", version, about)]
struct Args {
    /// Ticker or coin symbol, e.g. AAPL or BTC
    symbol: String,

    /// Asset class: stock or crypto
    #[arg(long, default_value = "crypto")]
    asset_type: AssetType,

    /// Prediction timeframe: 15m, 1h, 4h, 8h, 12h, 1d, 3d, 1w
    #[arg(long, default_value = "4h")]
    timeframe: Timeframe,

    /// Directory holding {SYMBOL}_{timeframe}.csv bar files
    #[arg(long, default_value = "data")]
    data_dir: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = EngineConfig::from_env()?;

    let source = CachedSource::new(
        CsvDataSource::new(&args.data_dir),
        Duration::from_secs(config.cache_ttl_secs),
    );

    info!(symbol = %args.symbol, timeframe = %args.timeframe, "fetching history");

    // Primary and daily macro series load concurrently
    let (series, macro_series) = tokio::try_join!(
        source.fetch(&args.symbol, args.timeframe),
        source.fetch(&args.symbol, Timeframe::OneDay),
    )?;

    let engine = PredictionEngine::new(config);
    let prediction = engine.predict(&PredictionRequest {
        symbol: args.symbol.to_uppercase(),
        asset_type: args.asset_type,
        timeframe: args.timeframe,
        series,
        macro_series,
    })?;

    println!("{}", serde_json::to_string_pretty(&prediction)?);
    Ok(())
}
