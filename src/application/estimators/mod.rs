use crate::application::scaler::FeatureScaler;
use crate::domain::features::FeatureVector;
use crate::domain::valuation::{EstimatorId, EstimatorPrediction};
use serde::{Deserialize, Serialize};

pub mod boosted;
pub mod forest;
pub mod neural;
pub mod rule_based;

pub use boosted::{BoostedModel, BoostedTreeEstimator};
pub use forest::{BaggedTreeEstimator, ForestModel};
pub use neural::{NeuralEstimator, NeuralNet};
pub use rule_based::RuleBasedEstimator;

/// Interface for valuation estimators.
///
/// `predict` is CPU-bound and synchronous; the engine fans estimators out
/// on blocking tasks under a per-estimator timeout. An `Err` means the
/// estimator is unavailable for this request, never a fatal fault.
pub trait Estimator: Send + Sync {
    fn id(&self) -> EstimatorId;

    fn predict(&self, features: &FeatureVector) -> Result<EstimatorPrediction, String>;
}

/// Trained model parameters plus the feature scaler, versioned by
/// training timestamp. Process-wide and read-only during serving; a
/// retraining run builds a new instance out-of-place and the engine
/// swaps the shared pointer atomically.
#[derive(Serialize, Deserialize)]
pub struct ModelArtifacts {
    pub version: i64,
    pub scaler: FeatureScaler,
    pub neural: Option<NeuralNet>,
    pub forest: Option<ForestModel>,
    pub boosted: Option<BoostedModel>,
}

impl ModelArtifacts {
    /// Untrained state: identity scaler, no models. Serving from this
    /// falls through to the rule-based estimator.
    pub fn empty() -> Self {
        Self {
            version: 0,
            scaler: FeatureScaler::identity(),
            neural: None,
            forest: None,
            boosted: None,
        }
    }

    pub fn has_trained_models(&self) -> bool {
        self.neural.is_some() || self.forest.is_some() || self.boosted.is_some()
    }
}

/// Model persistence collaborator. Used only by the out-of-request
/// retraining flow and at startup.
pub trait ModelStore: Send + Sync {
    fn load(&self) -> anyhow::Result<Option<ModelArtifacts>>;
    fn save(&self, artifacts: &ModelArtifacts) -> anyhow::Result<()>;
}
