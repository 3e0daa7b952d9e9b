use crate::domain::errors::ValuationError;
use crate::domain::valuation::{
    CombinedEstimate, EstimatorFailure, EstimatorId, EstimatorPrediction,
};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution};
use tracing::debug;

/// Base ensemble weights before renormalization. Hand-tuned defaults
/// carried over from the trained deployment; configurable, not derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleWeights {
    pub neural: f64,
    pub bagged_tree: f64,
    pub boosted_tree: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            neural: 0.5,
            bagged_tree: 0.3,
            boosted_tree: 0.2,
        }
    }
}

impl EnsembleWeights {
    fn base_weight(&self, id: EstimatorId) -> f64 {
        match id {
            EstimatorId::Neural => self.neural,
            EstimatorId::BaggedTree => self.bagged_tree,
            EstimatorId::BoostedTree => self.boosted_tree,
            // The rule-based fallback only ever runs alone.
            EstimatorId::RuleBased => 1.0,
        }
    }
}

/// Merges available estimator outputs into one value plus model
/// uncertainty. Unavailable estimators are dropped and the remaining
/// weights renormalized to sum to 1.
#[derive(Debug, Clone, Default)]
pub struct PredictionCombiner {
    weights: EnsembleWeights,
}

impl PredictionCombiner {
    pub fn new(weights: EnsembleWeights) -> Self {
        Self { weights }
    }

    /// Fails only when the prediction set is empty; the error carries the
    /// per-estimator failure reasons for the caller.
    pub fn combine(
        &self,
        predictions: &[(EstimatorId, EstimatorPrediction)],
        failures: &[EstimatorFailure],
    ) -> Result<CombinedEstimate, ValuationError> {
        if predictions.is_empty() {
            return Err(ValuationError::InsufficientEstimators {
                failures: failures.to_vec(),
            });
        }

        let total_weight: f64 = predictions
            .iter()
            .map(|(id, _)| self.weights.base_weight(*id))
            .sum();

        let weights: Vec<(EstimatorId, f64)> = predictions
            .iter()
            .map(|(id, _)| (*id, self.weights.base_weight(*id) / total_weight))
            .collect();

        let value: f64 = predictions
            .iter()
            .zip(weights.iter())
            .map(|((_, pred), (_, w))| w * pred.value)
            .sum();

        // Native uncertainty comes from the estimators that report one
        // (the neural head, or the rule-based constant); disagreement
        // across values supplies the rest.
        let native_uncertainty = predictions
            .iter()
            .filter_map(|(_, pred)| pred.uncertainty)
            .fold(0.0_f64, f64::max);

        let values: Vec<f64> = predictions.iter().map(|(_, p)| p.value).collect();
        let disagreement = if values.len() >= 2 {
            Data::new(values).variance().unwrap_or(0.0)
        } else {
            0.0
        };

        let model_uncertainty = (native_uncertainty.powi(2) + disagreement).sqrt();

        debug!(
            value,
            model_uncertainty,
            estimators = predictions.len(),
            dropped = failures.len(),
            "combined ensemble predictions"
        );

        Ok(CombinedEstimate {
            value,
            model_uncertainty,
            weights,
        })
    }
}
