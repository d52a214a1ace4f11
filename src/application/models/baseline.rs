//! Baseline weighted regression over a handful of normalised features
//!
//! Serves as the sanity anchor in the consensus: a linear blend of trend,
//! momentum and recent returns that is hard to surprise.

use super::{ModelContext, SignalModel};
use crate::application::features::TechnicalFeatures;
use crate::application::indicators;
use crate::domain::types::ModelOutput;

const DIRECTION_THRESHOLD: f64 = 0.02;

#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineRegression;

impl BaselineRegression {
    pub fn evaluate(features: &TechnicalFeatures, close: &[f64]) -> ModelOutput {
        let mut score = 0.0;
        let mut weights = 0.0;

        // Trend: fractional EMA12-vs-EMA50 separation
        if features.ema_50 != 0.0 {
            let trend = (features.ema_12 - features.ema_50) / features.ema_50;
            score += trend * 0.25;
            weights += 0.25;
        }

        // RSI centred on its midpoint
        score += (features.rsi_14 - 50.0) / 50.0 * 0.2;
        weights += 0.2;

        // MACD histogram, squashed so tiny absolute values still register
        score += (features.macd_histogram * 1000.0).tanh() * 0.2;
        weights += 0.2;

        let returns = indicators::log_returns(close);
        if let Some(&last) = returns.last() {
            score += last * 2.0 * 0.2;
            weights += 0.2;
        }
        if returns.len() > 5 {
            // Mean reversion: fade the average of the last five returns
            let window = &returns[returns.len() - 5..];
            let mean = window.iter().sum::<f64>() / window.len() as f64;
            score -= mean * 0.15;
            weights += 0.15;
        }

        let normalised = if weights > 0.0 { score / weights } else { 0.0 };

        let prediction = if normalised > DIRECTION_THRESHOLD {
            1.0
        } else if normalised < -DIRECTION_THRESHOLD {
            -1.0
        } else {
            0.0
        };

        let confidence = (normalised.abs() * 7.5).min(1.0) * 100.0;
        if !confidence.is_finite() {
            return ModelOutput::new(prediction, 50.0);
        }
        ModelOutput::new(prediction, confidence)
    }
}

impl SignalModel for BaselineRegression {
    fn score(&self, ctx: &ModelContext<'_>) -> ModelOutput {
        Self::evaluate(ctx.features, ctx.close)
    }

    fn name(&self) -> &'static str {
        "BaselineRegression"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neutral_features() -> TechnicalFeatures {
        TechnicalFeatures {
            ema_9: 100.0,
            ema_12: 100.0,
            ema_21: 100.0,
            ema_50: 100.0,
            ema_200: 100.0,
            bb_upper: 102.0,
            bb_middle: 100.0,
            bb_lower: 98.0,
            bb_width: 0.04,
            bb_position: 0.5,
            rsi_14: 50.0,
            rsi_21: 50.0,
            stoch_k: 50.0,
            stoch_d: 50.0,
            williams_r: -50.0,
            cci: 0.0,
            mfi: 50.0,
            macd_line: 0.0,
            macd_signal: 0.0,
            macd_histogram: 0.0,
            atr_14: 1.0,
            atr_21: 1.0,
            volatility_20: 2.0,
            volatility_50: 2.0,
            volume_sma: 1000.0,
            volume_ratio: 1.0,
            obv: 0.0,
            adx: 20.0,
            trend_strength: 0.0,
            higher_highs: 5.0,
            higher_lows: 5.0,
            momentum_1h: 0.0,
            momentum_4h: 0.0,
            momentum_1d: 0.0,
        }
    }

    fn geometric(n: usize, step_pct: f64) -> Vec<f64> {
        let mut out = Vec::with_capacity(n);
        let mut price = 100.0;
        for _ in 0..n {
            out.push(price);
            price *= 1.0 + step_pct / 100.0;
        }
        out
    }

    #[test]
    fn test_bullish_confluence_votes_up() {
        let features = TechnicalFeatures {
            ema_12: 105.0,
            ema_50: 100.0,
            rsi_14: 60.0,
            macd_histogram: 0.5,
            ..neutral_features()
        };
        let close = geometric(30, 1.0);
        let out = BaselineRegression::evaluate(&features, &close);
        assert_eq!(out.prediction, 1.0);
        assert!(out.confidence > 50.0);
    }

    #[test]
    fn test_bearish_confluence_votes_down() {
        let features = TechnicalFeatures {
            ema_12: 95.0,
            ema_50: 100.0,
            rsi_14: 35.0,
            macd_histogram: -0.5,
            ..neutral_features()
        };
        let close = geometric(30, -1.0);
        let out = BaselineRegression::evaluate(&features, &close);
        assert_eq!(out.prediction, -1.0);
    }

    #[test]
    fn test_neutral_inputs_hold() {
        // MACD histogram exactly zero, flat trend, flat closes
        let out = BaselineRegression::evaluate(&neutral_features(), &[100.0; 30]);
        assert_eq!(out.prediction, 0.0);
        assert_eq!(out.confidence, 0.0);
    }

    #[test]
    fn test_small_tilt_below_threshold_holds() {
        // Trend contributes 0.01 * 0.25 / 1.0 = 0.0025, well under 0.02
        let features = TechnicalFeatures {
            ema_12: 101.0,
            ema_50: 100.0,
            ..neutral_features()
        };
        let out = BaselineRegression::evaluate(&features, &[100.0; 30]);
        assert_eq!(out.prediction, 0.0);
    }

    #[test]
    fn test_short_close_series_still_scores() {
        // One close: no returns at all, the remaining terms carry the vote
        let features = TechnicalFeatures {
            ema_12: 110.0,
            ema_50: 100.0,
            rsi_14: 70.0,
            macd_histogram: 1.0,
            ..neutral_features()
        };
        let out = BaselineRegression::evaluate(&features, &[100.0]);
        assert_eq!(out.prediction, 1.0);
    }
}
