//! Market-regime classification from EMA separation and volatility level

use crate::domain::types::MarketRegime;

/// Three-tier TRENDING/RANGING classifier, evaluated in fixed priority:
///
/// 1. wide EMA separation (> 1.5 %) with volatility holding above 0.9x its
///    running mean -> TRENDING
/// 2. tight separation (< 0.5 %) with volatility below 1.1x its mean
///    -> RANGING
/// 3. fallback on separation alone, split at 0.8 %
///
/// Missing inputs classify as RANGING (the conservative default).
pub fn detect_market_regime(ema_fast: &[f64], ema_slow: &[f64], volatility: &[f64]) -> MarketRegime {
    let (Some(&latest_fast), Some(&latest_slow), Some(&latest_vol)) =
        (ema_fast.last(), ema_slow.last(), volatility.last())
    else {
        return MarketRegime::Ranging;
    };
    if latest_slow == 0.0 {
        return MarketRegime::Ranging;
    }

    let ema_separation = (latest_fast - latest_slow).abs() / latest_slow * 100.0;
    let avg_vol = volatility.iter().sum::<f64>() / volatility.len() as f64;

    if ema_separation > 1.5 && latest_vol > avg_vol * 0.9 {
        return MarketRegime::Trending;
    }
    if ema_separation < 0.5 && latest_vol < avg_vol * 1.1 {
        return MarketRegime::Ranging;
    }
    if ema_separation > 0.8 {
        MarketRegime::Trending
    } else {
        MarketRegime::Ranging
    }
}
