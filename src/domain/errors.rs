use crate::domain::valuation::EstimatorFailure;
use thiserror::Error;

/// Request-fatal errors. Everything else in the pipeline degrades
/// locally: estimator failures lower the ensemble weighting, collaborator
/// failures fall back to documented defaults, and both are surfaced in
/// the returned result rather than raised.
#[derive(Debug, Error)]
pub enum ValuationError {
    /// Malformed or missing required asset fields. Rejected before
    /// feature assembly.
    #[error("invalid asset descriptor: {reason}")]
    InvalidInput { reason: String },

    /// Every estimator was unavailable and no rule-based fallback is
    /// configured. Carries the per-estimator failure reasons.
    #[error("no estimator produced a prediction: {}", describe_failures(failures))]
    InsufficientEstimators { failures: Vec<EstimatorFailure> },

    /// The overall request deadline elapsed before any estimator
    /// completed.
    #[error("valuation deadline of {deadline_ms}ms exceeded before any estimator completed")]
    DeadlineExceeded { deadline_ms: u64 },
}

fn describe_failures(failures: &[EstimatorFailure]) -> String {
    if failures.is_empty() {
        return "no estimators configured".to_string();
    }
    failures
        .iter()
        .map(|f| format!("{}: {}", f.estimator, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}
