use crate::domain::errors::PredictionError;
use crate::domain::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Stock,
    Crypto,
}

impl FromStr for AssetType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stock" => Ok(AssetType::Stock),
            "crypto" => Ok(AssetType::Crypto),
            _ => anyhow::bail!("Invalid asset type: {}. Must be 'stock' or 'crypto'", s),
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetType::Stock => write!(f, "stock"),
            AssetType::Crypto => write!(f, "crypto"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSignal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSignal::Buy => write!(f, "BUY"),
            TradeSignal::Sell => write!(f, "SELL"),
            TradeSignal::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketRegime {
    Trending,
    Ranging,
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketRegime::Trending => write!(f, "TRENDING"),
            MarketRegime::Ranging => write!(f, "RANGING"),
        }
    }
}

/// Daily-timeframe directional bias derived from the macro series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacroTrend {
    Bullish,
    Bearish,
}

/// Minimum usable bars in each input series
pub const MIN_BARS: usize = 50;

/// One asset's OHLCV history, oldest bar first
///
/// Owned by the fetch collaborator; the engine only reads it. All four
/// member series must have equal length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub close: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub volume: Vec<f64>,
}

impl PriceSeries {
    pub fn new(
        close: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        volume: Vec<f64>,
    ) -> Result<Self, PredictionError> {
        let n = close.len();
        if high.len() != n || low.len() != n || volume.len() != n {
            return Err(PredictionError::MalformedSeries {
                symbol: String::new(),
                reason: format!(
                    "series lengths differ: close={} high={} low={} volume={}",
                    n,
                    high.len(),
                    low.len(),
                    volume.len()
                ),
            });
        }
        Ok(Self {
            close,
            high,
            low,
            volume,
        })
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.close.last().copied()
    }
}

/// One model's vote: signed direction in [-1, 1] and confidence in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    pub prediction: f64,
    pub confidence: f64,
}

impl ModelOutput {
    pub fn new(prediction: f64, confidence: f64) -> Self {
        Self {
            prediction,
            confidence,
        }
    }

    pub fn neutral() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Intermediate consensus values, exposed so the calibration behaviour
/// (caps, bonuses, flags) stays observable downstream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusBreakdown {
    pub total_direction: f64,
    pub agreement_bonus: f64,
    /// Pre-adjustment confidence, capped at 98
    pub final_confidence: f64,
    /// Post-adjustment confidence, capped at 99
    pub adjusted_confidence: f64,
    pub volatility_multiplier: f64,
    pub short_term_boost: f64,
    pub strong_agreement: bool,
    pub macro_aligned: bool,
    pub direction_match: bool,
}

/// Final engine output, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub symbol: String,
    pub asset_type: AssetType,
    pub timeframe: Timeframe,
    pub current_price: f64,
    pub predicted_price: f64,
    pub percent_change: f64,
    pub signal: TradeSignal,
    /// Calibrated confidence in [0, 99]
    pub confidence: f64,
    pub stop_loss: f64,
    pub market_regime: MarketRegime,
    pub macro_trend: MacroTrend,
    pub prediction_time: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub breakdown: ConsensusBreakdown,
}
