use crate::application::estimators::{Estimator, ModelArtifacts};
use crate::domain::features::FeatureVector;
use crate::domain::valuation::{clamp_uncertainty, clamp_value, EstimatorId, EstimatorPrediction};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One fully connected layer, weights stored row-major `out_dim x in_dim`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    in_dim: usize,
    out_dim: usize,
    weights: Vec<f64>,
    bias: Vec<f64>,
}

impl DenseLayer {
    pub fn new(in_dim: usize, out_dim: usize, weights: Vec<f64>, bias: Vec<f64>) -> Result<Self, String> {
        if weights.len() != in_dim * out_dim {
            return Err(format!(
                "layer weights length {} does not match {}x{}",
                weights.len(),
                out_dim,
                in_dim
            ));
        }
        if bias.len() != out_dim || out_dim == 0 {
            return Err(format!("layer bias length {} does not match out_dim {}", bias.len(), out_dim));
        }
        Ok(Self { in_dim, out_dim, weights, bias })
    }

    fn forward(&self, input: &Array1<f64>) -> Result<Array1<f64>, String> {
        if input.len() != self.in_dim {
            return Err(format!("input length {} does not match in_dim {}", input.len(), self.in_dim));
        }
        let w = Array2::from_shape_vec((self.out_dim, self.in_dim), self.weights.clone())
            .map_err(|e| format!("weight matrix shape error: {}", e))?;
        let b = Array1::from_vec(self.bias.clone());
        Ok(w.dot(input) + &b)
    }
}

/// Feed-forward valuation network: ReLU trunk feeding a log-space value
/// head and a softplus uncertainty head. Weights are produced offline and
/// loaded through the model store; this module only runs inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralNet {
    trunk: Vec<DenseLayer>,
    value_head: DenseLayer,
    uncertainty_head: DenseLayer,
}

impl NeuralNet {
    pub fn new(trunk: Vec<DenseLayer>, value_head: DenseLayer, uncertainty_head: DenseLayer) -> Self {
        Self { trunk, value_head, uncertainty_head }
    }

    /// Returns (log_value, uncertainty >= 0) for a scaled feature row.
    pub fn forward(&self, scaled: &[f64]) -> Result<(f64, f64), String> {
        let mut x = Array1::from_vec(scaled.to_vec());
        for layer in &self.trunk {
            x = layer.forward(&x)?.mapv(|v| v.max(0.0));
        }

        let value_out = self.value_head.forward(&x)?;
        let log_value = value_out
            .first()
            .copied()
            .ok_or_else(|| "value head produced no output".to_string())?;

        let unc_out = self.uncertainty_head.forward(&x)?;
        let raw_unc = unc_out
            .first()
            .copied()
            .ok_or_else(|| "uncertainty head produced no output".to_string())?;

        Ok((log_value, softplus(raw_unc)))
    }
}

fn softplus(x: f64) -> f64 {
    // ln(1 + e^x), stable for large x
    if x > 20.0 {
        x
    } else {
        x.exp().ln_1p()
    }
}

/// Neural estimator over the current model artifacts. Unavailable until
/// trained weights have been loaded.
pub struct NeuralEstimator {
    artifacts: Arc<ModelArtifacts>,
}

impl NeuralEstimator {
    pub fn new(artifacts: Arc<ModelArtifacts>) -> Self {
        Self { artifacts }
    }
}

impl Estimator for NeuralEstimator {
    fn id(&self) -> EstimatorId {
        EstimatorId::Neural
    }

    fn predict(&self, features: &FeatureVector) -> Result<EstimatorPrediction, String> {
        let net = self
            .artifacts
            .neural
            .as_ref()
            .ok_or_else(|| "neural weights not loaded".to_string())?;

        let scaled = self.artifacts.scaler.transform(features);
        let (log_value, uncertainty) = net.forward(&scaled)?;

        Ok(EstimatorPrediction {
            value: clamp_value(log_value.exp()),
            uncertainty: Some(clamp_uncertainty(uncertainty)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::scaler::FeatureScaler;
    use crate::domain::features::FEATURE_LEN;
    use crate::domain::valuation::{UNCERTAINTY_CEILING, VALUE_CEILING};

    fn tiny_net(log_value_bias: f64, unc_bias: f64) -> NeuralNet {
        // Identity trunk layer over the first two inputs.
        let trunk = vec![DenseLayer::new(2, 2, vec![1.0, 0.0, 0.0, 1.0], vec![0.0, 0.0]).unwrap()];
        let value_head = DenseLayer::new(2, 1, vec![0.0, 0.0], vec![log_value_bias]).unwrap();
        let uncertainty_head = DenseLayer::new(2, 1, vec![0.0, 0.0], vec![unc_bias]).unwrap();
        NeuralNet::new(trunk, value_head, uncertainty_head)
    }

    #[test]
    fn test_forward_value_is_log_space() {
        let net = tiny_net(5_000.0_f64.ln(), 0.0);
        let (log_value, unc) = net.forward(&[0.3, 0.7]).unwrap();
        assert!((log_value.exp() - 5_000.0).abs() < 1e-6);
        // softplus(0) = ln 2
        assert!((unc - 2.0_f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let net = tiny_net(1.0, 0.0);
        assert!(net.forward(&[0.1, 0.2, 0.3]).is_err());
    }

    #[test]
    fn test_layer_shape_validation() {
        assert!(DenseLayer::new(2, 2, vec![1.0; 3], vec![0.0; 2]).is_err());
        assert!(DenseLayer::new(2, 2, vec![1.0; 4], vec![0.0; 1]).is_err());
    }

    #[test]
    fn test_softplus_stability() {
        assert!((softplus(0.0) - 2.0_f64.ln()).abs() < 1e-12);
        assert_eq!(softplus(50.0), 50.0);
        assert!(softplus(-50.0) > 0.0);
    }

    fn artifacts_with_net(net: Option<NeuralNet>) -> Arc<ModelArtifacts> {
        Arc::new(ModelArtifacts {
            version: 1,
            scaler: FeatureScaler::identity(),
            neural: net,
            forest: None,
            boosted: None,
        })
    }

    fn full_width_net(log_value_bias: f64, unc_bias: f64) -> NeuralNet {
        let trunk = vec![DenseLayer::new(
            FEATURE_LEN,
            1,
            vec![0.0; FEATURE_LEN],
            vec![0.0],
        )
        .unwrap()];
        NeuralNet::new(
            trunk,
            DenseLayer::new(1, 1, vec![0.0], vec![log_value_bias]).unwrap(),
            DenseLayer::new(1, 1, vec![0.0], vec![unc_bias]).unwrap(),
        )
    }

    #[test]
    fn test_estimator_unavailable_without_weights() {
        let est = NeuralEstimator::new(artifacts_with_net(None));
        let err = est.predict(&FeatureVector::new([0.0; FEATURE_LEN])).unwrap_err();
        assert!(err.contains("not loaded"));
    }

    #[test]
    fn test_estimator_clamps_outputs() {
        // Absurdly large log-value and uncertainty both clamp.
        let est = NeuralEstimator::new(artifacts_with_net(Some(full_width_net(40.0, 30.0))));
        let pred = est.predict(&FeatureVector::new([0.5; FEATURE_LEN])).unwrap();
        assert_eq!(pred.value, VALUE_CEILING);
        assert_eq!(pred.uncertainty, Some(UNCERTAINTY_CEILING));
    }

    #[test]
    fn test_estimator_prediction_in_range() {
        let est = NeuralEstimator::new(artifacts_with_net(Some(full_width_net(8.0, -2.0))));
        let pred = est.predict(&FeatureVector::new([0.2; FEATURE_LEN])).unwrap();
        assert!((pred.value - 8.0_f64.exp()).abs() < 1e-6);
        let unc = pred.uncertainty.unwrap();
        assert!((0.01..=0.8).contains(&unc));
    }
}
