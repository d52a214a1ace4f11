mod baseline;
mod gradient_boost;
mod rule_ensemble;
mod sequence;

pub use baseline::BaselineRegression;
pub use gradient_boost::{DecisionStump, GradientBoost, SplitFeature, StumpEnsemble};
pub use rule_ensemble::{RuleEnsemble, RuleScore};
pub use sequence::{
    PatternScores, SequenceExtrapolation, detect_patterns, multi_horizon_consensus,
};

use crate::application::features::TechnicalFeatures;
use crate::domain::timeframe::Timeframe;
use crate::domain::types::ModelOutput;

/// Shared read-only view each model scores against.
pub struct ModelContext<'a> {
    pub features: &'a TechnicalFeatures,
    pub close: &'a [f64],
    pub timeframe: Timeframe,
}

/// Seam for the independent scoring models feeding the consensus.
///
/// Each implementation is a deterministic function of the context; there is
/// no training state carried between requests.
pub trait SignalModel: Send + Sync {
    fn score(&self, ctx: &ModelContext<'_>) -> ModelOutput;

    fn name(&self) -> &'static str;
}
