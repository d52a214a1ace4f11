//! Multi-model consensus and signal calibration
//!
//! Combines the four model votes with fixed weights, applies the agreement
//! bonus, the volatility multiplier and the short-term boost, then gates
//! the final BUY/SELL decision on confidence, momentum and macro alignment.
//! Every constant in here is load-bearing.

use crate::application::models::PatternScores;
use crate::domain::timeframe::Timeframe;
use crate::domain::types::{ConsensusBreakdown, MacroTrend, ModelOutput, TradeSignal};
use tracing::debug;

const SEQUENCE_WEIGHT: f64 = 0.35;
const GRADIENT_BOOST_WEIGHT: f64 = 0.25;
const RULE_ENSEMBLE_WEIGHT: f64 = 0.30;
const BASELINE_WEIGHT: f64 = 0.10;

const AGREEMENT_BONUS: f64 = 15.0;
const CHAOS_PENALTY: f64 = -20.0;
const DIRECTION_SIGNAL_THRESHOLD: f64 = 0.05;
const ATR_STOP_MULTIPLIER: f64 = 1.5;

/// Everything the aggregator needs, already computed upstream.
///
/// A model slot left as `None` drops out of the weighted average and its
/// weight is redistributed across the rest.
pub struct ConsensusInputs {
    pub sequence: Option<ModelOutput>,
    pub gradient_boost: Option<ModelOutput>,
    pub rule_ensemble: Option<ModelOutput>,
    pub baseline: Option<ModelOutput>,
    /// Mean fractional change over the 5/10/20-bar horizons, in [-1, 1]
    pub multi_horizon: f64,
    pub patterns: PatternScores,
    pub macro_trend: MacroTrend,
    pub timeframe: Timeframe,
    pub current_price: f64,
    pub latest_atr: Option<f64>,
    pub latest_volatility: Option<f64>,
}

/// Calibrated decision handed back to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsensusDecision {
    pub signal: TradeSignal,
    pub predicted_price: f64,
    pub stop_loss: f64,
    pub breakdown: ConsensusBreakdown,
}

pub fn aggregate(inputs: &ConsensusInputs) -> ConsensusDecision {
    let weighted = [
        (inputs.sequence, SEQUENCE_WEIGHT),
        (inputs.gradient_boost, GRADIENT_BOOST_WEIGHT),
        (inputs.rule_ensemble, RULE_ENSEMBLE_WEIGHT),
        (inputs.baseline, BASELINE_WEIGHT),
    ];

    let mut total_direction = 0.0;
    let mut total_conf = 0.0;
    let mut weight_sum = 0.0;
    for (output, weight) in weighted {
        if let Some(out) = output {
            total_direction += out.prediction * weight;
            total_conf += out.confidence * weight;
            weight_sum += weight;
        }
    }
    if weight_sum > 0.0 {
        total_direction /= weight_sum;
        total_conf /= weight_sum;
    }

    // Agreement bonus needs all three primary models present: a unanimous
    // non-zero sign earns the bonus, three distinct signs take the penalty
    let agreement_bonus = match (inputs.sequence, inputs.gradient_boost, inputs.rule_ensemble) {
        (Some(seq), Some(gb), Some(rule)) => {
            let s1 = sign(seq.prediction);
            let s2 = sign(gb.prediction);
            let s3 = sign(rule.prediction);
            if s1 == s2 && s2 == s3 && s1 != 0 {
                AGREEMENT_BONUS
            } else if s1 != s2 && s1 != s3 && s2 != s3 {
                CHAOS_PENALTY
            } else {
                0.0
            }
        }
        _ => 0.0,
    };

    let pattern_edge = (inputs.patterns.bullish - inputs.patterns.bearish).abs() * 0.2;
    let final_confidence = (total_conf + agreement_bonus + pattern_edge).clamp(0.0, 98.0);

    let is_short_term = inputs.timeframe.is_short_term();
    let strong_agreement = match (inputs.sequence, inputs.rule_ensemble) {
        (Some(seq), Some(rule)) => {
            seq.prediction.abs() > DIRECTION_SIGNAL_THRESHOLD
                && rule.prediction.abs() > DIRECTION_SIGNAL_THRESHOLD
        }
        _ => false,
    };
    let macro_aligned = (total_direction > 0.0 && inputs.macro_trend == MacroTrend::Bullish)
        || (total_direction < 0.0 && inputs.macro_trend == MacroTrend::Bearish);
    let direction_match = sign(total_direction) == sign(inputs.multi_horizon);

    // Short term treats high volatility as breakout fuel; long term damps it
    let latest_vol = inputs.latest_volatility.unwrap_or(2.0);
    let volatility_multiplier = match (is_short_term, latest_vol > 5.0) {
        (true, true) => 1.1,
        (false, true) => 0.7,
        (_, false) => 1.0,
    };

    let short_term_boost = if is_short_term && strong_agreement {
        20.0
    } else {
        0.0
    };

    let adjusted_confidence =
        ((final_confidence + short_term_boost) * volatility_multiplier).clamp(0.0, 99.0);

    let predicted_change =
        inputs.multi_horizon * (adjusted_confidence / 100.0) * (latest_vol / 100.0);
    let predicted_price = inputs.current_price * (1.0 + predicted_change);

    let latest_atr = match inputs.latest_atr {
        Some(a) if a > 0.0 => a,
        _ => inputs.current_price * 0.02,
    };

    let confidence_threshold = if is_short_term { 60.0 } else { 75.0 };
    let is_eligible = adjusted_confidence > confidence_threshold;

    // Rule-ensemble direction must back the blended direction, and long-term
    // trades additionally need the macro trend on side
    let momentum_aligned = match inputs.rule_ensemble {
        Some(rule) => {
            (rule.prediction > 0.0 && total_direction > 0.0)
                || (rule.prediction < 0.0 && total_direction < 0.0)
        }
        None => false,
    };
    let should_trade = is_eligible && momentum_aligned && (is_short_term || macro_aligned);

    let (signal, stop_loss) = if should_trade && total_direction > DIRECTION_SIGNAL_THRESHOLD {
        (
            TradeSignal::Buy,
            inputs.current_price - latest_atr * ATR_STOP_MULTIPLIER,
        )
    } else if should_trade && total_direction < -DIRECTION_SIGNAL_THRESHOLD {
        (
            TradeSignal::Sell,
            inputs.current_price + latest_atr * ATR_STOP_MULTIPLIER,
        )
    } else {
        (TradeSignal::Hold, inputs.current_price)
    };

    debug!(
        total_direction,
        final_confidence,
        adjusted_confidence,
        %signal,
        "consensus aggregated"
    );

    ConsensusDecision {
        signal,
        predicted_price,
        stop_loss,
        breakdown: ConsensusBreakdown {
            total_direction,
            agreement_bonus,
            final_confidence,
            adjusted_confidence,
            volatility_multiplier,
            short_term_boost,
            strong_agreement,
            macro_aligned,
            direction_match,
        },
    }
}

fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_inputs() -> ConsensusInputs {
        ConsensusInputs {
            sequence: Some(ModelOutput::new(0.5, 60.0)),
            gradient_boost: Some(ModelOutput::new(0.4, 50.0)),
            rule_ensemble: Some(ModelOutput::new(1.0, 70.0)),
            baseline: Some(ModelOutput::new(1.0, 55.0)),
            multi_horizon: 0.1,
            patterns: PatternScores {
                bullish: 6.0,
                bearish: 1.0,
            },
            macro_trend: MacroTrend::Bullish,
            timeframe: Timeframe::FourHour,
            current_price: 100.0,
            latest_atr: Some(2.0),
            latest_volatility: Some(3.0),
        }
    }

    #[test]
    fn test_unanimous_models_earn_agreement_bonus() {
        let decision = aggregate(&base_inputs());
        assert_eq!(decision.breakdown.agreement_bonus, 15.0);
        assert_eq!(decision.signal, TradeSignal::Buy);
        // BUY stop sits 1.5 ATR below price
        assert!((decision.stop_loss - (100.0 - 3.0)).abs() < 1e-9);
        assert!(decision.predicted_price > 100.0);
    }

    #[test]
    fn test_three_way_disagreement_takes_chaos_penalty() {
        let mut inputs = base_inputs();
        inputs.sequence = Some(ModelOutput::new(0.5, 60.0));
        inputs.gradient_boost = Some(ModelOutput::new(-0.4, 50.0));
        inputs.rule_ensemble = Some(ModelOutput::new(0.0, 40.0));
        let decision = aggregate(&inputs);
        assert_eq!(decision.breakdown.agreement_bonus, -20.0);
    }

    #[test]
    fn test_two_way_split_has_no_bonus() {
        let mut inputs = base_inputs();
        inputs.gradient_boost = Some(ModelOutput::new(-0.4, 50.0));
        let decision = aggregate(&inputs);
        assert_eq!(decision.breakdown.agreement_bonus, 0.0);
    }

    #[test]
    fn test_missing_model_redistributes_weight() {
        let mut inputs = base_inputs();
        inputs.baseline = None;
        let decision = aggregate(&inputs);
        // (0.5*0.35 + 0.4*0.25 + 1.0*0.30) / 0.90
        let expected = (0.5 * 0.35 + 0.4 * 0.25 + 1.0 * 0.30) / 0.90;
        assert!((decision.breakdown.total_direction - expected).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_caps() {
        let mut inputs = base_inputs();
        inputs.sequence = Some(ModelOutput::new(1.0, 100.0));
        inputs.gradient_boost = Some(ModelOutput::new(1.0, 100.0));
        inputs.rule_ensemble = Some(ModelOutput::new(1.0, 100.0));
        inputs.baseline = Some(ModelOutput::new(1.0, 100.0));
        inputs.patterns = PatternScores {
            bullish: 50.0,
            bearish: 0.0,
        };
        let decision = aggregate(&inputs);
        assert_eq!(decision.breakdown.final_confidence, 98.0);
        assert_eq!(decision.breakdown.adjusted_confidence, 99.0);
    }

    #[test]
    fn test_threshold_is_strictly_greater() {
        // A single rule-ensemble vote renormalises to exactly its own
        // confidence, so adjusted confidence lands exactly on the
        // short-term gate of 60 with no bonus, boost or multiplier in
        // play. Momentum alignment is satisfied; only the strict
        // comparison holds the trade.
        let mut inputs = base_inputs();
        inputs.sequence = None;
        inputs.gradient_boost = None;
        inputs.baseline = None;
        inputs.rule_ensemble = Some(ModelOutput::new(1.0, 60.0));
        inputs.patterns = PatternScores::default();
        let decision = aggregate(&inputs);
        assert_eq!(decision.breakdown.adjusted_confidence, 60.0);
        assert!(decision.breakdown.total_direction > 0.05);
        assert_eq!(decision.signal, TradeSignal::Hold);

        // One point above the gate trades
        inputs.rule_ensemble = Some(ModelOutput::new(1.0, 61.0));
        let decision = aggregate(&inputs);
        assert!(decision.breakdown.adjusted_confidence > 60.0);
        assert_eq!(decision.signal, TradeSignal::Buy);
    }

    #[test]
    fn test_long_term_needs_macro_alignment() {
        let mut inputs = base_inputs();
        inputs.timeframe = Timeframe::OneDay;
        inputs.macro_trend = MacroTrend::Bearish;
        inputs.sequence = Some(ModelOutput::new(1.0, 90.0));
        inputs.gradient_boost = Some(ModelOutput::new(1.0, 90.0));
        inputs.rule_ensemble = Some(ModelOutput::new(1.0, 90.0));
        inputs.baseline = Some(ModelOutput::new(1.0, 90.0));
        let blocked = aggregate(&inputs);
        assert_eq!(blocked.signal, TradeSignal::Hold);
        assert!(!blocked.breakdown.macro_aligned);

        inputs.macro_trend = MacroTrend::Bullish;
        let allowed = aggregate(&inputs);
        assert_eq!(allowed.signal, TradeSignal::Buy);
    }

    #[test]
    fn test_momentum_misalignment_blocks_trade() {
        let mut inputs = base_inputs();
        // Rule ensemble holds while the blend is positive
        inputs.rule_ensemble = Some(ModelOutput::new(0.0, 90.0));
        inputs.sequence = Some(ModelOutput::new(1.0, 90.0));
        inputs.gradient_boost = Some(ModelOutput::new(1.0, 90.0));
        let decision = aggregate(&inputs);
        assert_eq!(decision.signal, TradeSignal::Hold);
    }

    #[test]
    fn test_sell_stop_above_price_and_atr_fallback() {
        let mut inputs = base_inputs();
        inputs.sequence = Some(ModelOutput::new(-1.0, 90.0));
        inputs.gradient_boost = Some(ModelOutput::new(-1.0, 90.0));
        inputs.rule_ensemble = Some(ModelOutput::new(-1.0, 90.0));
        inputs.baseline = Some(ModelOutput::new(-1.0, 90.0));
        inputs.macro_trend = MacroTrend::Bearish;
        inputs.multi_horizon = -0.1;
        inputs.latest_atr = Some(0.0);
        let decision = aggregate(&inputs);
        assert_eq!(decision.signal, TradeSignal::Sell);
        // Zero ATR falls back to 2% of price: stop = 100 + 1.5 * 2
        assert!((decision.stop_loss - 103.0).abs() < 1e-9);
        assert!(decision.predicted_price < 100.0);
    }

    #[test]
    fn test_short_term_boost_and_volatility_regimes() {
        let mut inputs = base_inputs();
        inputs.latest_volatility = Some(6.0);
        let short = aggregate(&inputs);
        assert_eq!(short.breakdown.short_term_boost, 20.0);
        assert_eq!(short.breakdown.volatility_multiplier, 1.1);

        inputs.timeframe = Timeframe::OneDay;
        let long = aggregate(&inputs);
        assert_eq!(long.breakdown.short_term_boost, 0.0);
        assert_eq!(long.breakdown.volatility_multiplier, 0.7);
    }

    #[test]
    fn test_missing_volatility_defaults_to_two() {
        let mut inputs = base_inputs();
        inputs.latest_volatility = None;
        let decision = aggregate(&inputs);
        assert_eq!(decision.breakdown.volatility_multiplier, 1.0);
        // predicted change = 0.1 * adj/100 * 2/100
        let expected = 100.0 * (1.0 + 0.1 * (decision.breakdown.adjusted_confidence / 100.0) * 0.02);
        assert!((decision.predicted_price - expected).abs() < 1e-9);
    }
}
