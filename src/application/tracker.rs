use crate::application::uncertainty::DEFAULT_HISTORICAL_R2;
use serde::Serialize;
use std::sync::Mutex;

/// Snapshot of serving metrics, for observability endpoints and the CLI.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TrackerSnapshot {
    pub prediction_count: u64,
    pub historical_r2: Option<f64>,
    pub last_trained: Option<i64>,
}

/// Tracks prediction volume and the rolling model accuracy that feeds the
/// accuracy-uncertainty term. Shared across concurrent requests.
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    state: Mutex<TrackerSnapshot>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_prediction(&self) {
        let mut state = self.lock();
        state.prediction_count += 1;
    }

    pub fn record_training(&self, r2: f64, trained_at: i64) {
        let mut state = self.lock();
        state.historical_r2 = Some(r2.clamp(0.0, 1.0));
        state.last_trained = Some(trained_at);
    }

    /// R² of the last training run, or the documented neutral default
    /// when no history is tracked yet.
    pub fn historical_r2(&self) -> f64 {
        self.lock().historical_r2.unwrap_or(DEFAULT_HISTORICAL_R2)
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        *self.lock()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerSnapshot> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
