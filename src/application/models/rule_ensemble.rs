//! Rule-based ensemble scorer: six weighted indicator signals
//!
//! The weights and thresholds below are behavioural contracts, not tuning
//! suggestions. Short-term timeframes (1h/4h/8h/12h) lean harder on RSI and
//! Bollinger mean-reversion; long-term leans on the EMA cross.

use super::{ModelContext, SignalModel};
use crate::application::features::TechnicalFeatures;
use crate::domain::timeframe::Timeframe;
use crate::domain::types::{ModelOutput, TradeSignal};
use tracing::debug;

/// Discrete vote with the signal decision already applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleScore {
    /// -1, 0 or +1
    pub direction: f64,
    pub confidence: f64,
    pub signal: TradeSignal,
    /// Raw normalised score before the signal thresholds
    pub net_score: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleEnsemble;

impl RuleEnsemble {
    pub fn evaluate(features: &TechnicalFeatures, timeframe: Timeframe) -> RuleScore {
        let short_term = timeframe.is_short_term();

        let mut bullish: f64 = 0.0;
        let mut bearish: f64 = 0.0;
        let mut weights: f64 = 0.0;

        // 1. RSI with trend-shifted bands: an uptrend lifts both the
        //    oversold and overbought limits
        let uptrend = features.ema_12 > features.ema_50;
        let oversold = if uptrend { 40.0 } else { 30.0 };
        let overbought = if uptrend { 80.0 } else { 70.0 };
        let rsi_weight = if short_term { 0.25 } else { 0.15 };
        if features.rsi_14 < oversold {
            bullish += rsi_weight * (1.0 + (oversold - features.rsi_14) / 10.0);
        } else if features.rsi_14 > overbought {
            bearish += rsi_weight * (1.0 + (features.rsi_14 - overbought) / 10.0);
        }
        weights += rsi_weight;

        // 2. MACD histogram sign
        if features.macd_histogram > 0.0 {
            bullish += 0.15;
        } else {
            bearish += 0.15;
        }
        weights += 0.15;

        // 3. EMA cross, with EMA9 as the short-horizon confirmation
        let ema_weight = if short_term { 0.15 } else { 0.30 };
        if features.ema_12 > features.ema_50 {
            bullish += ema_weight;
            if features.ema_9 > features.ema_12 {
                bullish += 0.05;
            }
        } else {
            bearish += ema_weight;
            if features.ema_9 < features.ema_12 {
                bearish += 0.05;
            }
        }
        weights += ema_weight + 0.05;

        // 4. Bollinger band extremes (mean reversion)
        let bb_weight = if short_term { 0.20 } else { 0.15 };
        if features.bb_position < 0.15 {
            bullish += bb_weight;
        } else if features.bb_position > 0.85 {
            bearish += bb_weight;
        }
        weights += bb_weight;

        // 5. ADX confirms the EMA-cross direction only when the trend has
        //    conviction
        if features.adx > 25.0 {
            if features.ema_12 > features.ema_50 {
                bullish += 0.15;
            } else {
                bearish += 0.15;
            }
        }
        weights += 0.15;

        // 6. Volume reinforces whichever side currently leads
        if features.volume_ratio > 1.2 {
            if bullish > bearish {
                bullish += 0.1;
            } else {
                bearish += 0.1;
            }
        }
        weights += 0.1;

        let net_score = (bullish - bearish) / weights;
        let confidence_multiplier = if short_term { 180.0 } else { 120.0 };
        let confidence = (net_score.abs() * confidence_multiplier).min(100.0);

        let signal_threshold = if short_term { 0.15 } else { 0.25 };
        let confidence_gate = if short_term { 50.0 } else { 60.0 };

        let (direction, signal) = if net_score > signal_threshold && confidence > confidence_gate {
            (1.0, TradeSignal::Buy)
        } else if net_score < -signal_threshold && confidence > confidence_gate {
            (-1.0, TradeSignal::Sell)
        } else {
            (0.0, TradeSignal::Hold)
        };

        debug!(
            net_score,
            confidence,
            %signal,
            "rule ensemble scored"
        );

        RuleScore {
            direction,
            confidence,
            signal,
            net_score,
        }
    }
}

impl SignalModel for RuleEnsemble {
    fn score(&self, ctx: &ModelContext<'_>) -> ModelOutput {
        let score = Self::evaluate(ctx.features, ctx.timeframe);
        ModelOutput::new(score.direction, score.confidence)
    }

    fn name(&self) -> &'static str {
        "RuleEnsemble"
    }
}
