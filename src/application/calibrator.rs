use crate::domain::valuation::RankedComparable;
use tracing::debug;

const LOWER_BOUND_FACTOR: f64 = 0.5;
const UPPER_BOUND_FACTOR: f64 = 2.0;

/// Pulls an estimate toward the comparable median when it falls outside
/// the soft market-implied range [0.5*min, 2*max]. Identity on an empty
/// comparables set and on in-bound values, so calibration is idempotent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketBoundCalibrator;

impl MarketBoundCalibrator {
    pub fn new() -> Self {
        Self
    }

    pub fn calibrate(&self, estimated_value: f64, comparables: &[RankedComparable]) -> f64 {
        if comparables.is_empty() {
            return estimated_value;
        }

        let mut prices: Vec<f64> = comparables.iter().map(|c| c.sale.price).collect();
        prices.sort_by(|a, b| a.total_cmp(b));

        let min = prices[0];
        let max = prices[prices.len() - 1];
        let median = median_of_sorted(&prices);

        let lower = LOWER_BOUND_FACTOR * min;
        let upper = UPPER_BOUND_FACTOR * max;

        if estimated_value < lower || estimated_value > upper {
            let calibrated = (estimated_value + median) / 2.0;
            debug!(
                estimated_value,
                calibrated, lower, upper, median, "estimate pulled toward comparable median"
            );
            calibrated
        } else {
            estimated_value
        }
    }
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
