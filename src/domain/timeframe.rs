use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle interval a prediction request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    FifteenMin,
    OneHour,
    FourHour,
    EightHour,
    TwelveHour,
    OneDay,
    ThreeDay,
    OneWeek,
}

impl Timeframe {
    /// Intraday bucket that uses the relaxed thresholds and the
    /// breakout-friendly volatility treatment
    pub fn is_short_term(&self) -> bool {
        matches!(
            self,
            Timeframe::OneHour | Timeframe::FourHour | Timeframe::EightHour | Timeframe::TwelveHour
        )
    }

    /// How long the emitted prediction stays actionable ("next ~5 candles")
    pub fn validity_hours(&self) -> i64 {
        match self {
            Timeframe::OneHour => 5,
            Timeframe::FourHour => 20,
            Timeframe::EightHour => 40,
            _ => 24,
        }
    }

    /// Exchange-style interval string (matches Binance kline intervals)
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::FifteenMin => "15m",
            Timeframe::OneHour => "1h",
            Timeframe::FourHour => "4h",
            Timeframe::EightHour => "8h",
            Timeframe::TwelveHour => "12h",
            Timeframe::OneDay => "1d",
            Timeframe::ThreeDay => "3d",
            Timeframe::OneWeek => "1w",
        }
    }

    /// All accepted timeframes in ascending order
    pub fn all() -> Vec<Timeframe> {
        vec![
            Timeframe::FifteenMin,
            Timeframe::OneHour,
            Timeframe::FourHour,
            Timeframe::EightHour,
            Timeframe::TwelveHour,
            Timeframe::OneDay,
            Timeframe::ThreeDay,
            Timeframe::OneWeek,
        ]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "15m" => Ok(Timeframe::FifteenMin),
            "1h" => Ok(Timeframe::OneHour),
            "4h" => Ok(Timeframe::FourHour),
            "8h" => Ok(Timeframe::EightHour),
            "12h" => Ok(Timeframe::TwelveHour),
            "1d" => Ok(Timeframe::OneDay),
            "3d" => Ok(Timeframe::ThreeDay),
            "1w" => Ok(Timeframe::OneWeek),
            _ => Err(anyhow!(
                "Invalid timeframe: {}. Must be one of 15m/1h/4h/8h/12h/1d/3d/1w",
                s
            )),
        }
    }
}
