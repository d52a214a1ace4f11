//! Feature extraction: one fixed-shape snapshot per prediction request
//!
//! Every indicator is computed with its fixed period and reduced to its
//! latest value. An indicator that could not warm up falls back to its
//! neutral midpoint (RSI -> 50, bb_position -> 0.5, ...) so downstream
//! scorers see "no opinion" instead of an artificial zero bias.

use crate::application::indicators;
use crate::domain::errors::PredictionError;
use crate::domain::types::PriceSeries;
use serde::{Deserialize, Serialize};

/// Fixed feature vector consumed by all scoring models.
///
/// Invariant: every field is finite. Created fresh per request and
/// discarded afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalFeatures {
    pub ema_9: f64,
    pub ema_12: f64,
    pub ema_21: f64,
    pub ema_50: f64,
    pub ema_200: f64,

    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub bb_width: f64,
    pub bb_position: f64,

    pub rsi_14: f64,
    pub rsi_21: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub williams_r: f64,
    pub cci: f64,
    pub mfi: f64,

    pub macd_line: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,

    pub atr_14: f64,
    pub atr_21: f64,
    pub volatility_20: f64,
    pub volatility_50: f64,

    pub volume_sma: f64,
    pub volume_ratio: f64,
    pub obv: f64,

    pub adx: f64,
    /// Signed EMA12-vs-EMA50 separation in percent; the conviction proxy
    pub trend_strength: f64,
    pub higher_highs: f64,
    pub higher_lows: f64,

    pub momentum_1h: f64,
    pub momentum_4h: f64,
    pub momentum_1d: f64,
}

impl TechnicalFeatures {
    pub fn extract(series: &PriceSeries, symbol: &str) -> Result<Self, PredictionError> {
        let close = &series.close;
        let high = &series.high;
        let low = &series.low;
        let volume = &series.volume;
        let current_price = series.latest_close().unwrap_or(0.0);

        let ema_9 = latest(&indicators::ema(close, 9), current_price);
        let ema_12 = latest(&indicators::ema(close, 12), current_price);
        let ema_21 = latest(&indicators::ema(close, 21), current_price);
        let ema_50 = latest(&indicators::ema(close, 50), current_price);
        let ema_200 = latest(&indicators::ema(close, 200), current_price);

        let bands = indicators::bollinger(close, 20, 2.0);
        let bb_upper = latest(&bands.upper, current_price);
        let bb_middle = latest(&bands.middle, current_price);
        let bb_lower = latest(&bands.lower, current_price);
        let band_range = bb_upper - bb_lower;
        let bb_width = if bb_middle != 0.0 {
            band_range / bb_middle
        } else {
            0.0
        };
        let bb_position = if band_range > 0.0 {
            (current_price - bb_lower) / band_range
        } else {
            0.5
        };

        let macd = indicators::macd(close, 12, 26, 9);

        let stoch = indicators::stochastic(high, low, close, 14);

        let volume_sma_series = indicators::sma(volume, 20);
        let last_volume = volume.last().copied().unwrap_or(0.0);
        let volume_sma = latest(&volume_sma_series, last_volume);
        let volume_ratio = if volume_sma > 0.0 {
            last_volume / volume_sma
        } else {
            1.0
        };

        let trend_strength = if ema_50 != 0.0 {
            (ema_12 - ema_50) / ema_50 * 100.0
        } else {
            0.0
        };

        let (higher_highs, higher_lows) = swing_counts(high, low, 10);

        let features = Self {
            ema_9,
            ema_12,
            ema_21,
            ema_50,
            ema_200,
            bb_upper,
            bb_middle,
            bb_lower,
            bb_width,
            bb_position,
            rsi_14: latest(&indicators::rsi(close, 14), 50.0),
            rsi_21: latest(&indicators::rsi(close, 21), 50.0),
            stoch_k: latest(&stoch.k, 50.0),
            stoch_d: latest(&stoch.d, 50.0),
            williams_r: latest(&indicators::williams_r(high, low, close, 14), -50.0),
            cci: latest(&indicators::cci(high, low, close, 20), 0.0),
            mfi: latest(&indicators::mfi(high, low, close, volume, 14), 50.0),
            macd_line: latest(&macd.macd, 0.0),
            macd_signal: latest(&macd.signal, 0.0),
            macd_histogram: latest(&macd.histogram, 0.0),
            atr_14: latest(&indicators::atr(high, low, close, 14), 0.0),
            atr_21: latest(&indicators::atr(high, low, close, 21), 0.0),
            volatility_20: latest(&indicators::volatility(close, 20), 0.0),
            volatility_50: latest(&indicators::volatility(close, 50), 0.0),
            volume_sma,
            volume_ratio,
            obv: latest(&indicators::obv(close, volume), 0.0),
            adx: latest(&indicators::adx(high, low, close, 14), 0.0),
            trend_strength,
            higher_highs,
            higher_lows,
            momentum_1h: percent_change(close, 1),
            momentum_4h: percent_change(close, 4),
            momentum_1d: percent_change(close, 24),
        };

        features.checked(symbol)
    }

    /// Reject any non-finite field. With neutral defaulting in place this
    /// indicates a defect upstream, not a data problem.
    fn checked(self, symbol: &str) -> Result<Self, PredictionError> {
        for (name, value) in self.named_fields() {
            if !value.is_finite() {
                return Err(PredictionError::InvalidFeature {
                    symbol: symbol.to_string(),
                    field: name,
                });
            }
        }
        Ok(self)
    }

    fn named_fields(&self) -> [(&'static str, f64); 34] {
        [
            ("ema_9", self.ema_9),
            ("ema_12", self.ema_12),
            ("ema_21", self.ema_21),
            ("ema_50", self.ema_50),
            ("ema_200", self.ema_200),
            ("bb_upper", self.bb_upper),
            ("bb_middle", self.bb_middle),
            ("bb_lower", self.bb_lower),
            ("bb_width", self.bb_width),
            ("bb_position", self.bb_position),
            ("rsi_14", self.rsi_14),
            ("rsi_21", self.rsi_21),
            ("stoch_k", self.stoch_k),
            ("stoch_d", self.stoch_d),
            ("williams_r", self.williams_r),
            ("cci", self.cci),
            ("mfi", self.mfi),
            ("macd_line", self.macd_line),
            ("macd_signal", self.macd_signal),
            ("macd_histogram", self.macd_histogram),
            ("atr_14", self.atr_14),
            ("atr_21", self.atr_21),
            ("volatility_20", self.volatility_20),
            ("volatility_50", self.volatility_50),
            ("volume_sma", self.volume_sma),
            ("volume_ratio", self.volume_ratio),
            ("obv", self.obv),
            ("adx", self.adx),
            ("trend_strength", self.trend_strength),
            ("higher_highs", self.higher_highs),
            ("higher_lows", self.higher_lows),
            ("momentum_1h", self.momentum_1h),
            ("momentum_4h", self.momentum_4h),
            ("momentum_1d", self.momentum_1d),
        ]
    }
}

fn latest(series: &[f64], default: f64) -> f64 {
    match series.last() {
        Some(v) if v.is_finite() => *v,
        _ => default,
    }
}

fn percent_change(close: &[f64], lookback: usize) -> f64 {
    let n = close.len();
    if n <= lookback {
        return 0.0;
    }
    let past = close[n - 1 - lookback];
    if past == 0.0 {
        return 0.0;
    }
    (close[n - 1] - past) / past * 100.0
}

/// Counts of higher-highs and higher-lows over the last `window` bar pairs.
fn swing_counts(high: &[f64], low: &[f64], window: usize) -> (f64, f64) {
    let n = high.len();
    if n < 2 {
        return (0.0, 0.0);
    }
    let start = n.saturating_sub(window).max(1);
    let mut hh = 0usize;
    let mut hl = 0usize;
    for i in start..n {
        if high[i] > high[i - 1] {
            hh += 1;
        }
        if low[i] > low[i - 1] {
            hl += 1;
        }
    }
    (hh as f64, hl as f64)
}
