use crate::domain::features::{FeatureVector, FEATURE_LEN};
use serde::{Deserialize, Serialize};

/// Standard scaler fitted during training and frozen alongside the model
/// weights. Serving applies it read-only; the identity scaler is used
/// until a first training run produces a fitted one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl FeatureScaler {
    /// Identity transform: zero mean shift, unit scale.
    pub fn identity() -> Self {
        Self {
            mean: vec![0.0; FEATURE_LEN],
            std: vec![1.0; FEATURE_LEN],
        }
    }

    /// Fits per-slot mean and std over the training rows. Slots with no
    /// spread keep unit scale so the transform stays invertible.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        if rows.is_empty() {
            return Self::identity();
        }
        let n = rows.len() as f64;
        let mut mean = vec![0.0; FEATURE_LEN];
        let mut std = vec![1.0; FEATURE_LEN];

        for j in 0..FEATURE_LEN {
            let m = rows.iter().map(|r| r[j]).sum::<f64>() / n;
            mean[j] = m;
            let var = rows.iter().map(|r| (r[j] - m).powi(2)).sum::<f64>() / n;
            let s = var.sqrt();
            if s > 1e-12 {
                std[j] = s;
            }
        }

        Self { mean, std }
    }

    pub fn transform(&self, features: &FeatureVector) -> Vec<f64> {
        features
            .as_slice()
            .iter()
            .enumerate()
            .map(|(j, v)| (v - self.mean[j]) / self.std[j])
            .collect()
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(j, v)| (v - self.mean[j]) / self.std[j])
            .collect()
    }
}

impl Default for FeatureScaler {
    fn default() -> Self {
        Self::identity()
    }
}
