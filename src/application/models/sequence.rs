//! Sequence heuristics: recency-weighted return extrapolation plus simple
//! swing/breakout pattern counting over the raw close/high/low arrays.

use super::{ModelContext, SignalModel};
use crate::application::indicators;
use crate::domain::types::ModelOutput;

const RETURN_WINDOW: usize = 10;
const CONSENSUS_LOOKBACKS: [usize; 3] = [5, 10, 20];
const PATTERN_WINDOW: usize = 5;
const BREAKOUT_LOOKBACK: usize = 20;

/// Recency-weighted extrapolation of the last few log returns.
///
/// The newest return gets the largest weight; the weighted mean is scaled
/// up and squashed so a sustained 1-2% drift per bar saturates the score.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceExtrapolation;

impl SequenceExtrapolation {
    pub fn evaluate(close: &[f64]) -> ModelOutput {
        let returns = indicators::log_returns(close);
        if returns.is_empty() {
            return ModelOutput::neutral();
        }

        let window = &returns[returns.len().saturating_sub(RETURN_WINDOW)..];
        let mut weighted = 0.0;
        let mut weight_sum = 0.0;
        for (i, r) in window.iter().enumerate() {
            let w = (i + 1) as f64;
            weighted += r * w;
            weight_sum += w;
        }
        let mean = weighted / weight_sum;

        // Confidence is neutral-centred: even a flat extrapolation is a
        // half-confident "no move" statement, not a zero-information one
        let prediction = (mean * 50.0).tanh();
        ModelOutput::new(prediction, (50.0 + prediction.abs() * 50.0).min(100.0))
    }
}

impl SignalModel for SequenceExtrapolation {
    fn score(&self, ctx: &ModelContext<'_>) -> ModelOutput {
        Self::evaluate(ctx.close)
    }

    fn name(&self) -> &'static str {
        "SequenceExtrapolation"
    }
}

/// Mean fractional change over several lookback horizons, clamped to
/// [-1, 1]. Horizons longer than the series are skipped.
pub fn multi_horizon_consensus(close: &[f64]) -> f64 {
    let n = close.len();
    let mut total = 0.0;
    let mut count = 0usize;
    for lookback in CONSENSUS_LOOKBACKS {
        if n <= lookback {
            continue;
        }
        let past = close[n - 1 - lookback];
        if past == 0.0 {
            continue;
        }
        total += (close[n - 1] - past) / past;
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    (total / count as f64).clamp(-1.0, 1.0)
}

/// Swing and breakout tallies over the most recent bars.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PatternScores {
    pub bullish: f64,
    pub bearish: f64,
}

/// Count higher-highs/higher-lows (and their bearish mirrors) over the last
/// five bar pairs, then add a double-weight breakout bonus when the latest
/// close escapes the prior 20-bar range.
pub fn detect_patterns(close: &[f64], high: &[f64], low: &[f64]) -> PatternScores {
    let n = close.len();
    let mut scores = PatternScores::default();
    if n < 2 || high.len() != n || low.len() != n {
        return scores;
    }

    let start = n.saturating_sub(PATTERN_WINDOW).max(1);
    for i in start..n {
        if high[i] > high[i - 1] {
            scores.bullish += 1.0;
        } else if high[i] < high[i - 1] {
            scores.bearish += 1.0;
        }
        if low[i] > low[i - 1] {
            scores.bullish += 1.0;
        } else if low[i] < low[i - 1] {
            scores.bearish += 1.0;
        }
    }

    if n > BREAKOUT_LOOKBACK {
        let window = &close[n - 1 - BREAKOUT_LOOKBACK..n - 1];
        let prior_high = window.iter().cloned().fold(f64::MIN, f64::max);
        let prior_low = window.iter().cloned().fold(f64::MAX, f64::min);
        let last = close[n - 1];
        if last > prior_high {
            scores.bullish += 2.0;
        } else if last < prior_low {
            scores.bearish += 2.0;
        }
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_rising_closes_extrapolate_up() {
        let close = geometric(30, 1.0);
        let out = SequenceExtrapolation::evaluate(&close);
        assert!(out.prediction > 0.0);
        // Steady 1% per bar: weighted mean ~ ln(1.01), tanh(50 * 0.00995)
        assert!((out.prediction - (50.0 * 1.01_f64.ln()).tanh()).abs() < 1e-9);
        assert!(out.confidence > 50.0);
    }

    #[test]
    fn test_falling_closes_extrapolate_down() {
        let close = geometric(30, -1.0);
        let out = SequenceExtrapolation::evaluate(&close);
        assert!(out.prediction < 0.0);
    }

    #[test]
    fn test_single_close_is_neutral() {
        let out = SequenceExtrapolation::evaluate(&[100.0]);
        assert_eq!(out.prediction, 0.0);
        assert_eq!(out.confidence, 0.0);
    }

    #[test]
    fn test_recency_weighting_prefers_latest_returns() {
        // Flat history with one fresh up-move outweighs flat history with
        // the same up-move buried ten bars back
        let mut fresh = vec![100.0; 15];
        fresh.push(103.0);
        let mut stale = vec![100.0; 5];
        stale.push(103.0);
        stale.extend(vec![103.0; 10]);

        let fresh_out = SequenceExtrapolation::evaluate(&fresh);
        let stale_out = SequenceExtrapolation::evaluate(&stale);
        assert!(fresh_out.prediction > stale_out.prediction);
    }

    #[test]
    fn test_multi_horizon_consensus_sign_and_clamp() {
        let rising = geometric(40, 1.0);
        assert!(multi_horizon_consensus(&rising) > 0.0);

        let falling = geometric(40, -1.0);
        assert!(multi_horizon_consensus(&falling) < 0.0);

        // Extreme move clamps at 1.0
        let mut spike = vec![1.0; 25];
        spike.push(1000.0);
        assert_eq!(multi_horizon_consensus(&spike), 1.0);
    }

    #[test]
    fn test_multi_horizon_skips_short_horizons() {
        // Only the 5-bar horizon fits
        let close = geometric(8, 1.0);
        let expected = (close[7] - close[2]) / close[2];
        assert!((multi_horizon_consensus(&close) - expected).abs() < 1e-12);

        assert_eq!(multi_horizon_consensus(&[100.0, 101.0]), 0.0);
    }

    #[test]
    fn test_detect_patterns_counts_swings() {
        // Strictly rising highs and lows over the window: 5 + 5 bullish
        let close = geometric(10, 1.0);
        let high: Vec<f64> = close.iter().map(|c| c * 1.01).collect();
        let low: Vec<f64> = close.iter().map(|c| c * 0.99).collect();
        let scores = detect_patterns(&close, &high, &low);
        assert_eq!(scores.bullish, 10.0);
        assert_eq!(scores.bearish, 0.0);
    }

    #[test]
    fn test_detect_patterns_breakout_bonus() {
        // Flat 25 bars then a close above the prior 20-bar high
        let mut close = vec![100.0; 25];
        close.push(105.0);
        let mut high = vec![100.5; 25];
        high.push(105.5);
        let mut low = vec![99.5; 25];
        low.push(104.5);

        let scores = detect_patterns(&close, &high, &low);
        // 1 higher-high + 1 higher-low from the last bar pair, +2 breakout
        assert_eq!(scores.bullish, 4.0);
        assert_eq!(scores.bearish, 0.0);
    }

    #[test]
    fn test_detect_patterns_too_short() {
        assert_eq!(
            detect_patterns(&[100.0], &[101.0], &[99.0]),
            PatternScores::default()
        );
    }
}
