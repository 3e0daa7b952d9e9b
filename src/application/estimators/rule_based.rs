use crate::application::estimators::Estimator;
use crate::domain::features::{slot, FeatureVector};
use crate::domain::valuation::{clamp_value, EstimatorId, EstimatorPrediction};

/// Fixed value-normalized uncertainty reported by the rule-based
/// fallback. A hand-tuned constant, deliberately wide.
pub const RULE_BASED_UNCERTAINTY: f64 = 0.3;

const BASE_VALUE: f64 = 1_000.0;
const VERIFIED_MULTIPLIER: f64 = 1.5;

/// Deterministic fallback used when no trained models are available.
///
/// Scores a weighted multiplier over the creator/content slots and never
/// fails, so a request can always be answered.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedEstimator;

impl RuleBasedEstimator {
    pub fn new() -> Self {
        Self
    }
}

impl Estimator for RuleBasedEstimator {
    fn id(&self) -> EstimatorId {
        EstimatorId::RuleBased
    }

    fn predict(&self, features: &FeatureVector) -> Result<EstimatorPrediction, String> {
        let multiplier = 1.0
            + 2.0 * features.get(slot::CREATOR_REPUTATION)
            + 1.5 * features.get(slot::QUALITY_SCORE)
            + 1.0 * features.get(slot::RARITY)
            + 0.5 * features.get(slot::HAS_LICENSE);

        let verified_boost = if features.get(slot::IS_VERIFIED) > 0.5 {
            VERIFIED_MULTIPLIER
        } else {
            1.0
        };

        Ok(EstimatorPrediction {
            value: clamp_value(BASE_VALUE * multiplier * verified_boost),
            uncertainty: Some(RULE_BASED_UNCERTAINTY),
        })
    }
}
