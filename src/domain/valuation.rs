use crate::domain::asset::{AssetDescriptor, HistoricalSale};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Hard bounds on any estimated value, in USD.
pub const VALUE_FLOOR: f64 = 100.0;
pub const VALUE_CEILING: f64 = 1_000_000.0;

/// Hard bounds on any native estimator uncertainty.
pub const UNCERTAINTY_FLOOR: f64 = 0.01;
pub const UNCERTAINTY_CEILING: f64 = 0.8;

pub fn clamp_value(value: f64) -> f64 {
    value.clamp(VALUE_FLOOR, VALUE_CEILING)
}

pub fn clamp_uncertainty(uncertainty: f64) -> f64 {
    uncertainty.clamp(UNCERTAINTY_FLOOR, UNCERTAINTY_CEILING)
}

/// Identity of one estimator in the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorId {
    Neural,
    BaggedTree,
    BoostedTree,
    RuleBased,
}

impl fmt::Display for EstimatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EstimatorId::Neural => "neural",
            EstimatorId::BaggedTree => "bagged_tree",
            EstimatorId::BoostedTree => "boosted_tree",
            EstimatorId::RuleBased => "rule_based",
        };
        write!(f, "{}", name)
    }
}

/// Output of a single estimator for one request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorPrediction {
    /// Estimated value in USD, clamped to [VALUE_FLOOR, VALUE_CEILING].
    pub value: f64,
    /// Native value-normalized uncertainty in
    /// [UNCERTAINTY_FLOOR, UNCERTAINTY_CEILING]. Tree estimators report
    /// `None`: ensemble disagreement supplies their uncertainty signal.
    pub uncertainty: Option<f64>,
}

/// Record of one estimator that failed to produce a prediction.
/// Non-fatal: carried in the result so callers can see the degradation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorFailure {
    pub estimator: EstimatorId,
    pub reason: String,
    pub timed_out: bool,
}

/// Ensemble output before uncertainty quantification and calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedEstimate {
    pub value: f64,
    pub model_uncertainty: f64,
    /// Renormalized weights actually used, summing to 1.
    pub weights: Vec<(EstimatorId, f64)>,
}

/// 95% confidence interval. Holds `lower <= value <= upper` by
/// construction for the value it was built around.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// A historical sale scored for relevance to the asset being valued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedComparable {
    pub sale: HistoricalSale,
    /// Similarity in [0, 1]; 1.0 is an exact match on category, creator,
    /// quality, rarity and recency.
    pub similarity: f64,
}

/// Direction of one explainable factor's contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorImpact {
    Positive,
    Neutral,
    Negative,
}

/// One scored factor with its classified impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub score: f64,
    pub impact: FactorImpact,
}

/// Aggregated historical signals surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalFactors {
    pub creator_avg_performance: f64,
    pub category_growth_rate: f64,
}

/// Risk breakdown. Each component and the aggregate lie in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub market_risk: f64,
    pub liquidity_risk: f64,
    pub creator_risk: f64,
    pub category_risk: f64,
    pub overall_risk_score: f64,
}

/// Explainable factor breakdown attached to every valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorReport {
    pub base_factors: BTreeMap<String, FactorScore>,
    pub market_factors: BTreeMap<String, FactorScore>,
    pub historical_factors: HistoricalFactors,
    pub risk_factors: RiskAssessment,
    /// Fraction of tracked factors classified positive.
    pub overall_confidence: f64,
}

/// Public request shape consumed by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationRequest {
    pub asset: AssetDescriptor,
    /// Caller-supplied comparables. When empty, the engine may consult
    /// the comparable-sales provider.
    #[serde(default)]
    pub historical_sales: Vec<HistoricalSale>,
}

/// Final valuation returned to the caller. Not retained by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationResult {
    pub estimated_value: f64,
    pub confidence_interval: ConfidenceInterval,
    /// Ranked comparables, at most 10.
    pub comparable_sales: Vec<RankedComparable>,
    pub factors: FactorReport,
    pub model_uncertainty: f64,
    /// Renormalized ensemble weights actually used.
    pub weights_used: Vec<(EstimatorId, f64)>,
    /// Estimators that were unavailable for this request. Empty on a
    /// fully healthy run.
    pub degraded: Vec<EstimatorFailure>,
    pub processing_time_ms: f64,
}
