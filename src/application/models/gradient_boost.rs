//! Gradient-boosted stump ensemble
//!
//! Deliberately minimal: each "tree" is a depth-1 stump whose split is
//! chosen by a fixed heuristic over the feature snapshot, so the ensemble
//! contributes a tree-shaped vote without pretending to be a trained
//! model. Nothing persists across requests.

use super::{ModelContext, SignalModel};
use crate::application::features::TechnicalFeatures;
use crate::domain::types::ModelOutput;

/// Feature a stump can split on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitFeature {
    Rsi14,
    TrendStrength,
}

impl SplitFeature {
    fn value(&self, features: &TechnicalFeatures) -> f64 {
        match self {
            SplitFeature::Rsi14 => features.rsi_14,
            SplitFeature::TrendStrength => features.trend_strength,
        }
    }
}

/// Depth-1 decision tree: one split, two constant leaves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionStump {
    pub feature: SplitFeature,
    pub threshold: f64,
    /// Returned when the feature value is below the threshold
    pub left: f64,
    /// Returned at or above the threshold
    pub right: f64,
}

impl DecisionStump {
    fn predict(&self, features: &TechnicalFeatures) -> f64 {
        if self.feature.value(features) < self.threshold {
            self.left
        } else {
            self.right
        }
    }
}

/// Split heuristic: momentum extremes win, then the trend cross, then a
/// neutral RSI split.
fn build_stump(features: &TechnicalFeatures) -> DecisionStump {
    let (feature, threshold) = if features.rsi_14 > 70.0 {
        (SplitFeature::Rsi14, 70.0)
    } else if features.rsi_14 < 30.0 {
        (SplitFeature::Rsi14, 30.0)
    } else if features.ema_12 > features.ema_50 {
        (SplitFeature::TrendStrength, 0.0)
    } else {
        (SplitFeature::Rsi14, 50.0)
    };
    DecisionStump {
        feature,
        threshold,
        left: -0.5,
        right: 0.5,
    }
}

#[derive(Debug, Clone)]
pub struct StumpEnsemble {
    stumps: Vec<DecisionStump>,
    weights: Vec<f64>,
    #[allow(dead_code)]
    learning_rate: f64,
}

impl StumpEnsemble {
    /// Build `num_trees` equal-weight stumps against the current snapshot.
    pub fn train(features: &TechnicalFeatures, num_trees: usize, learning_rate: f64) -> Self {
        let num_trees = num_trees.max(1);
        let stumps = (0..num_trees).map(|_| build_stump(features)).collect();
        let weights = vec![1.0 / num_trees as f64; num_trees];
        Self {
            stumps,
            weights,
            learning_rate,
        }
    }

    /// Weighted-average the stump votes, squash through tanh.
    ///
    /// Confidence is read off the pre-squash mean.
    pub fn predict(&self, features: &TechnicalFeatures) -> ModelOutput {
        let mut total = 0.0;
        let mut total_weight = 0.0;
        for (stump, weight) in self.stumps.iter().zip(&self.weights) {
            total += stump.predict(features) * weight;
            total_weight += weight;
        }
        if total_weight == 0.0 {
            return ModelOutput::neutral();
        }
        let mean = total / total_weight;
        ModelOutput::new(mean.tanh(), (mean.abs() * 100.0).min(100.0))
    }
}

/// `SignalModel` wrapper that trains fresh on every call.
#[derive(Debug, Clone, Copy)]
pub struct GradientBoost {
    pub num_trees: usize,
    pub learning_rate: f64,
}

impl SignalModel for GradientBoost {
    fn score(&self, ctx: &ModelContext<'_>) -> ModelOutput {
        StumpEnsemble::train(ctx.features, self.num_trees, self.learning_rate)
            .predict(ctx.features)
    }

    fn name(&self) -> &'static str {
        "GradientBoost"
    }
}
