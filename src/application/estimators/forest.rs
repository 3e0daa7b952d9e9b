use crate::application::estimators::{Estimator, ModelArtifacts};
use crate::domain::features::FeatureVector;
use crate::domain::valuation::{clamp_value, EstimatorId, EstimatorPrediction};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::sync::Arc;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

const N_TREES: usize = 100;
const MAX_TREE_DEPTH: u16 = 10;
const MIN_SAMPLES_SPLIT: usize = 5;

/// Bagged random-forest regressor over scaled feature rows, predicting
/// USD values directly.
#[derive(Serialize, Deserialize)]
pub struct ForestModel {
    model: Forest,
}

impl ForestModel {
    pub fn fit(x: &DenseMatrix<f64>, y: &Vec<f64>) -> Result<Self> {
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(N_TREES)
            .with_max_depth(MAX_TREE_DEPTH)
            .with_min_samples_split(MIN_SAMPLES_SPLIT);
        let model = RandomForestRegressor::fit(x, y, params)
            .map_err(|e| anyhow!("forest fit failed: {}", e))?;
        Ok(Self { model })
    }

    pub fn predict_one(&self, scaled: &[f64]) -> Result<f64, String> {
        let matrix = DenseMatrix::from_2d_vec(&vec![scaled.to_vec()])
            .map_err(|e| format!("matrix creation failed: {}", e))?;
        let predictions = self
            .model
            .predict(&matrix)
            .map_err(|e| format!("forest prediction failed: {}", e))?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| "no prediction returned".to_string())
    }

    pub fn predict_batch(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>> {
        self.model
            .predict(x)
            .map_err(|e| anyhow!("forest batch prediction failed: {}", e))
    }
}

/// Bagged-tree estimator over the current model artifacts. Reports no
/// native uncertainty; ensemble disagreement supplies that signal.
pub struct BaggedTreeEstimator {
    artifacts: Arc<ModelArtifacts>,
}

impl BaggedTreeEstimator {
    pub fn new(artifacts: Arc<ModelArtifacts>) -> Self {
        Self { artifacts }
    }
}

impl Estimator for BaggedTreeEstimator {
    fn id(&self) -> EstimatorId {
        EstimatorId::BaggedTree
    }

    fn predict(&self, features: &FeatureVector) -> Result<EstimatorPrediction, String> {
        let model = self
            .artifacts
            .forest
            .as_ref()
            .ok_or_else(|| "forest model not loaded".to_string())?;

        let scaled = self.artifacts.scaler.transform(features);
        let raw = model.predict_one(&scaled)?;

        Ok(EstimatorPrediction {
            value: clamp_value(raw),
            uncertainty: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::scaler::FeatureScaler;
    use crate::domain::features::FEATURE_LEN;

    fn training_rows() -> (DenseMatrix<f64>, Vec<f64>) {
        // Value scales with the first slot; the rest stay constant.
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..40 {
            let mut row = vec![0.5; FEATURE_LEN];
            row[0] = i as f64 / 40.0;
            rows.push(row);
            targets.push(1_000.0 + 8_000.0 * (i as f64 / 40.0));
        }
        (DenseMatrix::from_2d_vec(&rows).unwrap(), targets)
    }

    #[test]
    fn test_fit_and_predict_tracks_signal() {
        let (x, y) = training_rows();
        let model = ForestModel::fit(&x, &y).unwrap();

        let mut low = vec![0.5; FEATURE_LEN];
        low[0] = 0.05;
        let mut high = vec![0.5; FEATURE_LEN];
        high[0] = 0.95;

        let low_pred = model.predict_one(&low).unwrap();
        let high_pred = model.predict_one(&high).unwrap();
        assert!(high_pred > low_pred, "forest should track the training signal");
    }

    #[test]
    fn test_estimator_unavailable_without_model() {
        let artifacts = Arc::new(ModelArtifacts {
            version: 1,
            scaler: FeatureScaler::identity(),
            neural: None,
            forest: None,
            boosted: None,
        });
        let est = BaggedTreeEstimator::new(artifacts);
        let err = est.predict(&FeatureVector::new([0.5; FEATURE_LEN])).unwrap_err();
        assert!(err.contains("not loaded"));
    }

    #[test]
    fn test_estimator_reports_no_native_uncertainty() {
        let (x, y) = training_rows();
        let artifacts = Arc::new(ModelArtifacts {
            version: 1,
            scaler: FeatureScaler::identity(),
            neural: None,
            forest: Some(ForestModel::fit(&x, &y).unwrap()),
            boosted: None,
        });
        let est = BaggedTreeEstimator::new(artifacts);
        let pred = est.predict(&FeatureVector::new([0.5; FEATURE_LEN])).unwrap();
        assert!(pred.uncertainty.is_none());
        assert!((100.0..=1_000_000.0).contains(&pred.value));
    }
}
