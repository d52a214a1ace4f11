//! Prediction engine: validation, feature extraction, model fan-out and
//! final assembly of the response object.

use crate::application::consensus::{self, ConsensusInputs};
use crate::application::features::TechnicalFeatures;
use crate::application::indicators;
use crate::application::models::{
    BaselineRegression, GradientBoost, ModelContext, RuleEnsemble, SequenceExtrapolation,
    SignalModel, detect_patterns, multi_horizon_consensus,
};
use crate::application::regime::detect_market_regime;
use crate::config::EngineConfig;
use crate::domain::errors::PredictionError;
use crate::domain::timeframe::Timeframe;
use crate::domain::types::{AssetType, MacroTrend, Prediction, PriceSeries};
use chrono::{DateTime, Duration, Utc};
use tracing::info;

/// One prediction request: the asset identity plus its already-fetched
/// history on the requested timeframe and on the daily macro timeframe.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub symbol: String,
    pub asset_type: AssetType,
    pub timeframe: Timeframe,
    pub series: PriceSeries,
    pub macro_series: PriceSeries,
}

pub struct PredictionEngine {
    config: EngineConfig,
}

impl PredictionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline stamped with the current wall clock.
    pub fn predict(&self, request: &PredictionRequest) -> Result<Prediction, PredictionError> {
        self.predict_at(request, Utc::now())
    }

    /// Deterministic variant: identical inputs and `now` produce an
    /// identical prediction.
    pub fn predict_at(
        &self,
        request: &PredictionRequest,
        now: DateTime<Utc>,
    ) -> Result<Prediction, PredictionError> {
        self.check_depth(&request.symbol, &request.series)?;
        self.check_depth(&request.symbol, &request.macro_series)?;

        let series = &request.series;
        let close = &series.close;

        let features = TechnicalFeatures::extract(series, &request.symbol)?;

        let macro_trend = macro_trend(&request.macro_series.close);

        let ema_fast = indicators::ema(close, 12);
        let ema_slow = indicators::ema(close, 50);
        let volatility = indicators::volatility(close, 20);
        let market_regime = detect_market_regime(&ema_fast, &ema_slow, &volatility);

        let ctx = ModelContext {
            features: &features,
            close,
            timeframe: request.timeframe,
        };
        let sequence = SequenceExtrapolation.score(&ctx);
        let gradient_boost = GradientBoost {
            num_trees: self.config.num_stumps,
            learning_rate: self.config.learning_rate,
        }
        .score(&ctx);
        let rule_ensemble = RuleEnsemble.score(&ctx);
        let baseline = BaselineRegression.score(&ctx);

        let atr = indicators::atr(&series.high, &series.low, close, 14);

        let inputs = ConsensusInputs {
            sequence: Some(sequence),
            gradient_boost: Some(gradient_boost),
            rule_ensemble: Some(rule_ensemble),
            baseline: Some(baseline),
            multi_horizon: multi_horizon_consensus(close),
            patterns: detect_patterns(close, &series.high, &series.low),
            macro_trend,
            timeframe: request.timeframe,
            current_price: series.latest_close().unwrap_or(0.0),
            latest_atr: atr.last().copied(),
            latest_volatility: volatility.last().copied(),
        };
        let decision = consensus::aggregate(&inputs);

        let current_price = inputs.current_price;
        let percent_change = if current_price != 0.0 {
            (decision.predicted_price - current_price) / current_price * 100.0
        } else {
            0.0
        };

        info!(
            symbol = %request.symbol,
            timeframe = %request.timeframe,
            %market_regime,
            signal = %decision.signal,
            confidence = decision.breakdown.adjusted_confidence,
            "prediction generated"
        );

        Ok(Prediction {
            symbol: request.symbol.clone(),
            asset_type: request.asset_type,
            timeframe: request.timeframe,
            current_price,
            predicted_price: decision.predicted_price,
            percent_change,
            signal: decision.signal,
            confidence: decision.breakdown.adjusted_confidence,
            stop_loss: decision.stop_loss,
            market_regime,
            macro_trend,
            prediction_time: now,
            valid_until: now + Duration::hours(request.timeframe.validity_hours()),
            breakdown: decision.breakdown,
        })
    }

    fn check_depth(&self, symbol: &str, series: &PriceSeries) -> Result<(), PredictionError> {
        if series.len() < self.config.min_bars {
            return Err(PredictionError::InsufficientData {
                symbol: symbol.to_string(),
                bars: series.len(),
                required: self.config.min_bars,
            });
        }
        Ok(())
    }
}

/// Daily EMA12-over-EMA50 cross decides the macro bias.
fn macro_trend(macro_close: &[f64]) -> MacroTrend {
    let fast = indicators::ema(macro_close, 12);
    let slow = indicators::ema(macro_close, 50);
    match (fast.last(), slow.last()) {
        (Some(f), Some(s)) if f > s => MacroTrend::Bullish,
        _ => MacroTrend::Bearish,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TradeSignal;

    fn geometric_series(n: usize, step_pct: f64, volume: f64) -> PriceSeries {
        cycle_series(n, &[step_pct], volume, 1.0)
    }

    /// Builds a series whose per-bar percent steps repeat `steps`, with the
    /// last bar's volume scaled by `last_volume_mult`.
    fn cycle_series(n: usize, steps: &[f64], base_volume: f64, last_volume_mult: f64) -> PriceSeries {
        let mut close = Vec::with_capacity(n);
        let mut price = 100.0;
        close.push(price);
        for i in 1..n {
            price *= 1.0 + steps[(i - 1) % steps.len()] / 100.0;
            close.push(price);
        }
        let high: Vec<f64> = close.iter().map(|c| c * 1.005).collect();
        let low: Vec<f64> = close.iter().map(|c| c * 0.995).collect();
        let mut volume = vec![base_volume; n];
        volume[n - 1] *= last_volume_mult;
        PriceSeries::new(close, high, low, volume).unwrap()
    }

    fn request(series: PriceSeries, macro_series: PriceSeries, tf: Timeframe) -> PredictionRequest {
        PredictionRequest {
            symbol: "TEST".to_string(),
            asset_type: AssetType::Crypto,
            timeframe: tf,
            series,
            macro_series,
        }
    }

    #[test]
    fn test_insufficient_primary_series_rejected() {
        let engine = PredictionEngine::new(EngineConfig::default());
        let req = request(
            geometric_series(30, 1.0, 1000.0),
            geometric_series(100, 0.5, 1000.0),
            Timeframe::FourHour,
        );
        let err = engine.predict(&req).unwrap_err();
        match err {
            PredictionError::InsufficientData { bars, required, .. } => {
                assert_eq!(bars, 30);
                assert_eq!(required, 50);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_insufficient_macro_series_rejected() {
        let engine = PredictionEngine::new(EngineConfig::default());
        let req = request(
            geometric_series(100, 1.0, 1000.0),
            geometric_series(10, 0.5, 1000.0),
            Timeframe::FourHour,
        );
        assert!(matches!(
            engine.predict(&req),
            Err(PredictionError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_sustained_uptrend_signals_buy() {
        // Zigzag uptrend: two up bars per pullback keeps RSI off its
        // overbought band, a volume spike confirms the move
        let engine = PredictionEngine::new(EngineConfig::default());
        let req = request(
            cycle_series(100, &[-1.2, 1.5, 1.5], 1000.0, 2.5),
            geometric_series(100, 0.5, 1000.0),
            Timeframe::FourHour,
        );
        let prediction = engine.predict(&req).unwrap();
        assert_eq!(prediction.signal, TradeSignal::Buy);
        assert!(prediction.confidence > 60.0);
        assert!(prediction.stop_loss < prediction.current_price);
        assert_eq!(prediction.macro_trend, MacroTrend::Bullish);
    }

    #[test]
    fn test_flat_series_holds() {
        let engine = PredictionEngine::new(EngineConfig::default());
        let flat = geometric_series(100, 0.0, 1000.0);
        let req = request(flat.clone(), flat, Timeframe::FourHour);
        let prediction = engine.predict(&req).unwrap();
        assert_eq!(prediction.signal, TradeSignal::Hold);
        assert_eq!(prediction.stop_loss, prediction.current_price);
        assert_eq!(prediction.market_regime, crate::domain::types::MarketRegime::Ranging);
    }

    #[test]
    fn test_predict_at_is_deterministic() {
        let engine = PredictionEngine::new(EngineConfig::default());
        let req = request(
            geometric_series(120, 0.8, 1500.0),
            geometric_series(120, 0.3, 1500.0),
            Timeframe::OneHour,
        );
        let now = Utc::now();
        let a = engine.predict_at(&req, now).unwrap();
        let b = engine.predict_at(&req, now).unwrap();
        assert_eq!(a.predicted_price, b.predicted_price);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.signal, b.signal);
        assert_eq!(a.valid_until, b.valid_until);
    }

    #[test]
    fn test_validity_window_follows_timeframe() {
        let engine = PredictionEngine::new(EngineConfig::default());
        let now = Utc::now();
        for (tf, hours) in [
            (Timeframe::OneHour, 5),
            (Timeframe::FourHour, 20),
            (Timeframe::EightHour, 40),
            (Timeframe::OneDay, 24),
        ] {
            let req = request(
                geometric_series(100, 0.5, 1000.0),
                geometric_series(100, 0.5, 1000.0),
                tf,
            );
            let prediction = engine.predict_at(&req, now).unwrap();
            assert_eq!(prediction.valid_until, now + Duration::hours(hours));
        }
    }
}
