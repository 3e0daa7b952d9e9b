use crate::domain::features::{slot, FeatureVector};
use crate::domain::market::MarketSnapshot;
use crate::domain::valuation::{
    FactorImpact, FactorReport, FactorScore, HistoricalFactors, RiskAssessment,
};
use std::collections::BTreeMap;

/// (name, slot, high threshold, low threshold) per tracked base factor.
const BASE_FACTORS: [(&str, usize, f64, f64); 4] = [
    ("creator_reputation", slot::CREATOR_REPUTATION, 0.7, 0.3),
    ("content_quality", slot::QUALITY_SCORE, 0.7, 0.4),
    ("rarity", slot::RARITY, 0.7, 0.3),
    ("category_popularity", slot::CATEGORY_POPULARITY, 0.7, 0.4),
];

const MARKET_FACTORS: [(&str, usize, f64, f64); 3] = [
    ("market_sentiment", slot::MARKET_SENTIMENT, 0.6, 0.4),
    ("liquidity", slot::TRADING_FREQUENCY, 0.6, 0.3),
    ("category_volume", slot::CATEGORY_VOLUME_24H, 0.5, 0.2),
];

/// Maps feature slots to human-readable, direction-labeled factors.
/// Classification is a pure threshold comparison against the tables
/// above; thresholds are hand-tuned and documented, not derived.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactorExplainer;

impl FactorExplainer {
    pub fn new() -> Self {
        Self
    }

    pub fn explain(&self, features: &FeatureVector, market: &MarketSnapshot) -> FactorReport {
        let base_factors = score_table(&BASE_FACTORS, features);
        let market_factors = score_table(&MARKET_FACTORS, features);

        let historical_factors = HistoricalFactors {
            creator_avg_performance: features.get(slot::HIST_MEAN_PRICE),
            category_growth_rate: (features.get(slot::CATEGORY_VOLUME_24H)
                + features.get(slot::MARKET_SENTIMENT))
                / 2.0,
        };

        let market_risk = market
            .market_volatility
            .unwrap_or(features.get(slot::MARKET_VOLATILITY))
            .clamp(0.0, 1.0);
        let liquidity_risk = 1.0 - features.get(slot::TRADING_FREQUENCY);
        let creator_risk = 1.0 - features.get(slot::CREATOR_REPUTATION);
        let category_risk = 1.0 - features.get(slot::CATEGORY_POPULARITY);
        let overall_risk_score =
            ((market_risk + liquidity_risk + creator_risk + category_risk) / 4.0).clamp(0.0, 1.0);

        let risk_factors = RiskAssessment {
            market_risk,
            liquidity_risk,
            creator_risk,
            category_risk,
            overall_risk_score,
        };

        let total = base_factors.len() + market_factors.len();
        let positive = base_factors
            .values()
            .chain(market_factors.values())
            .filter(|f| f.impact == FactorImpact::Positive)
            .count();
        let overall_confidence = if total > 0 {
            positive as f64 / total as f64
        } else {
            0.0
        };

        FactorReport {
            base_factors,
            market_factors,
            historical_factors,
            risk_factors,
            overall_confidence,
        }
    }
}

fn score_table(
    table: &[(&str, usize, f64, f64)],
    features: &FeatureVector,
) -> BTreeMap<String, FactorScore> {
    table
        .iter()
        .map(|(name, index, high, low)| {
            let score = features.get(*index);
            (name.to_string(), FactorScore { score, impact: classify(score, *high, *low) })
        })
        .collect()
}

fn classify(score: f64, high: f64, low: f64) -> FactorImpact {
    if score >= high {
        FactorImpact::Positive
    } else if score <= low {
        FactorImpact::Negative
    } else {
        FactorImpact::Neutral
    }
}
