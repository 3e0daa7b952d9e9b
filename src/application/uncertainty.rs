use crate::domain::features::FeatureVector;
use crate::domain::market::MarketSnapshot;
use crate::domain::valuation::{CombinedEstimate, ConfidenceInterval};
use serde::{Deserialize, Serialize};

/// Default z-value for a 95% interval.
pub const DEFAULT_Z_VALUE: f64 = 1.96;

/// R² assumed for the accuracy term when no tracked history exists.
pub const DEFAULT_HISTORICAL_R2: f64 = 0.7;

const DEFAULT_MARKET_VOLATILITY: f64 = 0.2;
const LOWER_BOUND_FACTOR: f64 = 0.3;
const UPPER_BOUND_FACTOR: f64 = 3.0;

/// The five independent uncertainty sources, combined in quadrature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyBreakdown {
    pub model: f64,
    pub feature: f64,
    pub volatility: f64,
    pub data: f64,
    pub accuracy: f64,
    pub total: f64,
}

/// Synthesizes one calibrated confidence interval from model, feature,
/// market, data and historical-accuracy uncertainty.
#[derive(Debug, Clone, Copy)]
pub struct UncertaintyQuantifier {
    z_value: f64,
}

impl Default for UncertaintyQuantifier {
    fn default() -> Self {
        Self { z_value: DEFAULT_Z_VALUE }
    }
}

impl UncertaintyQuantifier {
    pub fn new(z_value: f64) -> Self {
        Self { z_value }
    }

    pub fn quantify(
        &self,
        combined: &CombinedEstimate,
        features: &FeatureVector,
        market: &MarketSnapshot,
        historical_r2: f64,
    ) -> UncertaintyBreakdown {
        let model = combined.model_uncertainty;

        // Richer feature signal narrows the band.
        let feature = (0.3 - 0.2 * features.mean()).max(0.0);

        let volatility =
            0.5 * market.market_volatility.unwrap_or(DEFAULT_MARKET_VOLATILITY);

        let completeness = (features.non_zero_fraction().clamp(0.0, 1.0)
            + market.present_field_fraction().clamp(0.0, 1.0))
            / 2.0;
        let data = 0.2 * (1.0 - completeness);

        let accuracy = 0.3 * (1.0 - historical_r2);

        let total = (model.powi(2)
            + feature.powi(2)
            + volatility.powi(2)
            + data.powi(2)
            + accuracy.powi(2))
        .sqrt();

        UncertaintyBreakdown { model, feature, volatility, data, accuracy, total }
    }

    /// Builds the interval around a point estimate. The margin is
    /// `value * total * z`, with bounds clamped to [0.3v, 3.0v] so the
    /// interval always brackets the value.
    pub fn interval_around(&self, value: f64, total_uncertainty: f64) -> ConfidenceInterval {
        let margin = value * total_uncertainty * self.z_value;
        ConfidenceInterval {
            lower: (value - margin).max(value * LOWER_BOUND_FACTOR),
            upper: (value + margin).min(value * UPPER_BOUND_FACTOR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::FEATURE_LEN;
    use crate::domain::valuation::EstimatorId;

    fn combined(uncertainty: f64) -> CombinedEstimate {
        CombinedEstimate {
            value: 5_000.0,
            model_uncertainty: uncertainty,
            weights: vec![(EstimatorId::RuleBased, 1.0)],
        }
    }

    fn flat_features(value: f64) -> FeatureVector {
        FeatureVector::new([value; FEATURE_LEN])
    }

    #[test]
    fn test_all_sources_combine_in_quadrature() {
        let q = UncertaintyQuantifier::default();
        let b = q.quantify(&combined(0.3), &flat_features(0.5), &MarketSnapshot::default(), 0.7);
        assert_eq!(b.model, 0.3);
        assert!((b.feature - 0.2).abs() < 1e-12); // 0.3 - 0.2*0.5
        assert!((b.volatility - 0.1).abs() < 1e-12); // 0.5 * default 0.2
        // completeness = (1.0 + 0.0) / 2 -> data = 0.1
        assert!((b.data - 0.1).abs() < 1e-12);
        assert!((b.accuracy - 0.09).abs() < 1e-12);
        let expected =
            (0.3f64.powi(2) + 0.2f64.powi(2) + 0.1f64.powi(2) + 0.1f64.powi(2) + 0.09f64.powi(2))
                .sqrt();
        assert!((b.total - expected).abs() < 1e-12);
    }

    #[test]
    fn test_feature_uncertainty_floors_at_zero() {
        let q = UncertaintyQuantifier::default();
        // mean 1.0 -> 0.3 - 0.2 = 0.1; mean well above 1.5 is impossible,
        // but the max(0) guard still matters for the formula itself.
        let b = q.quantify(&combined(0.0), &flat_features(1.0), &MarketSnapshot::default(), 1.0);
        assert!((b.feature - 0.1).abs() < 1e-12);
        assert!(b.feature >= 0.0);
    }

    #[test]
    fn test_perfect_r2_zeroes_accuracy_term() {
        let q = UncertaintyQuantifier::default();
        let b = q.quantify(&combined(0.0), &flat_features(0.5), &MarketSnapshot::default(), 1.0);
        assert_eq!(b.accuracy, 0.0);
    }

    #[test]
    fn test_interval_brackets_value() {
        let q = UncertaintyQuantifier::default();
        for total in [0.0, 0.1, 0.5, 1.0, 5.0] {
            let ci = q.interval_around(5_000.0, total);
            assert!(ci.lower <= 5_000.0, "lower {} breaks bracket", ci.lower);
            assert!(ci.upper >= 5_000.0, "upper {} breaks bracket", ci.upper);
        }
    }

    #[test]
    fn test_interval_clamps_to_soft_bounds() {
        let q = UncertaintyQuantifier::default();
        let ci = q.interval_around(5_000.0, 10.0);
        assert_eq!(ci.lower, 5_000.0 * 0.3);
        assert_eq!(ci.upper, 5_000.0 * 3.0);
    }

    #[test]
    fn test_margin_formula() {
        let q = UncertaintyQuantifier::default();
        let ci = q.interval_around(1_000.0, 0.1);
        // margin = 1000 * 0.1 * 1.96 = 196
        assert!((ci.lower - 804.0).abs() < 1e-9);
        assert!((ci.upper - 1_196.0).abs() < 1e-9);
    }

    #[test]
    fn test_sparser_inputs_widen_uncertainty() {
        let q = UncertaintyQuantifier::default();
        let full_market = MarketSnapshot {
            category_volume_24h: Some(500_000.0),
            category_avg_price: Some(5_000.0),
            market_volatility: Some(0.2),
            market_sentiment: Some(0.6),
            liquidity: Some(crate::domain::market::LiquidityMetrics {
                bid_ask_spread: 0.1,
                order_book_depth: 0.5,
                trading_frequency: 0.3,
            }),
            macro_indicators: Some(crate::domain::market::MacroIndicators {
                crypto_market_cap: 0.5,
                nft_market_sentiment: 0.5,
                risk_appetite: 0.5,
            }),
            ..Default::default()
        };
        let rich = q.quantify(&combined(0.2), &flat_features(0.5), &full_market, 0.7);
        let sparse =
            q.quantify(&combined(0.2), &flat_features(0.5), &MarketSnapshot::default(), 0.7);
        assert!(sparse.total > rich.total);
    }
}
