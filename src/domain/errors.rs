use thiserror::Error;

/// Errors surfaced by the prediction engine
///
/// The engine never retries internally; retries (alternate data sources,
/// ticker variants) belong to the fetch collaborator. An error here must
/// never degrade into a HOLD signal with a fabricated confidence.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Insufficient data for {symbol}: {bars} bars available, {required} required")]
    InsufficientData {
        symbol: String,
        bars: usize,
        required: usize,
    },

    #[error("Invalid feature for {symbol}: {field} is not finite")]
    InvalidFeature {
        symbol: String,
        field: &'static str,
    },

    #[error("Malformed series for {symbol}: {reason}")]
    MalformedSeries { symbol: String, reason: String },
}
