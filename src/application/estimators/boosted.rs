use crate::application::estimators::{Estimator, ModelArtifacts};
use crate::domain::features::FeatureVector;
use crate::domain::valuation::{clamp_value, EstimatorId, EstimatorPrediction};
use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use std::sync::Arc;

type RegressionTree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

pub const DEFAULT_BOOSTING_ROUNDS: usize = 50;
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;
const MAX_TREE_DEPTH: u16 = 3;

/// Gradient-boosted regression trees: shallow smartcore decision trees
/// fit sequentially on residuals. smartcore ships no boosting ensemble,
/// so the additive loop lives here; the trees themselves are smartcore's.
#[derive(Serialize, Deserialize)]
pub struct BoostedModel {
    base: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl BoostedModel {
    pub fn fit(x: &DenseMatrix<f64>, y: &[f64], rounds: usize, learning_rate: f64) -> Result<Self> {
        if y.is_empty() {
            bail!("cannot fit boosted model on empty targets");
        }

        let base = y.iter().sum::<f64>() / y.len() as f64;
        let mut residuals: Vec<f64> = y.iter().map(|v| v - base).collect();
        let mut trees = Vec::with_capacity(rounds);

        for round in 0..rounds {
            let params = DecisionTreeRegressorParameters::default().with_max_depth(MAX_TREE_DEPTH);
            let tree = DecisionTreeRegressor::fit(x, &residuals, params)
                .map_err(|e| anyhow!("boosting round {} failed: {}", round, e))?;
            let step = tree
                .predict(x)
                .map_err(|e| anyhow!("boosting round {} prediction failed: {}", round, e))?;
            for (r, p) in residuals.iter_mut().zip(step.iter()) {
                *r -= learning_rate * p;
            }
            trees.push(tree);
        }

        Ok(Self { base, learning_rate, trees })
    }

    pub fn predict_one(&self, scaled: &[f64]) -> Result<f64, String> {
        let matrix = DenseMatrix::from_2d_vec(&vec![scaled.to_vec()])
            .map_err(|e| format!("matrix creation failed: {}", e))?;

        let mut value = self.base;
        for tree in &self.trees {
            let step = tree
                .predict(&matrix)
                .map_err(|e| format!("boosted prediction failed: {}", e))?;
            value += self.learning_rate
                * step
                    .first()
                    .copied()
                    .ok_or_else(|| "no prediction returned".to_string())?;
        }
        Ok(value)
    }

    pub fn predict_batch(&self, x: &DenseMatrix<f64>, rows: usize) -> Result<Vec<f64>> {
        let mut values = vec![self.base; rows];
        for tree in &self.trees {
            let step = tree
                .predict(x)
                .map_err(|e| anyhow!("boosted batch prediction failed: {}", e))?;
            for (v, p) in values.iter_mut().zip(step.iter()) {
                *v += self.learning_rate * p;
            }
        }
        Ok(values)
    }
}

/// Boosted-tree estimator over the current model artifacts. Like the
/// bagged forest it reports no native uncertainty.
pub struct BoostedTreeEstimator {
    artifacts: Arc<ModelArtifacts>,
}

impl BoostedTreeEstimator {
    pub fn new(artifacts: Arc<ModelArtifacts>) -> Self {
        Self { artifacts }
    }
}

impl Estimator for BoostedTreeEstimator {
    fn id(&self) -> EstimatorId {
        EstimatorId::BoostedTree
    }

    fn predict(&self, features: &FeatureVector) -> Result<EstimatorPrediction, String> {
        let model = self
            .artifacts
            .boosted
            .as_ref()
            .ok_or_else(|| "boosted model not loaded".to_string())?;

        let scaled = self.artifacts.scaler.transform(features);
        let raw = model.predict_one(&scaled)?;

        Ok(EstimatorPrediction {
            value: clamp_value(raw),
            uncertainty: None,
        })
    }
}
