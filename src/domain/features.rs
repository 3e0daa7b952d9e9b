use serde::{Deserialize, Serialize};

/// Fixed length of the feature vector consumed by every estimator.
pub const FEATURE_LEN: usize = 30;

/// Semantically assigned slot indices.
///
/// This order is load-bearing: trained models, the rule-based fallback
/// and the factor explainer all address features by these indices. Any
/// change here is a breaking change for persisted model artifacts.
pub mod slot {
    // Creator / content (8 slots)
    pub const CREATOR_REPUTATION: usize = 0;
    pub const QUALITY_SCORE: usize = 1;
    pub const RARITY: usize = 2;
    pub const HAS_LICENSE: usize = 3;
    pub const IS_VERIFIED: usize = 4;
    pub const VIEWS: usize = 5;
    pub const LIKES: usize = 6;
    pub const SHARES: usize = 7;

    // Historical performance (5 slots)
    pub const HIST_MEAN_PRICE: usize = 8;
    pub const HIST_MAX_PRICE: usize = 9;
    pub const HIST_PRICE_STD: usize = 10;
    pub const HIST_COUNT: usize = 11;
    pub const HIST_MEAN_VOLUME: usize = 12;

    // Market / category (4 slots)
    pub const CATEGORY_POPULARITY: usize = 13;
    pub const CATEGORY_VOLUME_24H: usize = 14;
    pub const CATEGORY_AVG_PRICE: usize = 15;
    pub const MARKET_VOLATILITY: usize = 16;

    // Temporal (4 slots)
    pub const MARKET_SENTIMENT: usize = 17;
    pub const SEASONAL_FACTOR: usize = 18;
    pub const HOUR_OF_DAY: usize = 19;
    pub const DAY_OF_WEEK: usize = 20;

    // Liquidity (3 slots)
    pub const BID_ASK_SPREAD: usize = 21;
    pub const ORDER_BOOK_DEPTH: usize = 22;
    pub const TRADING_FREQUENCY: usize = 23;

    // Macro (3 slots)
    pub const CRYPTO_MARKET_CAP: usize = 24;
    pub const NFT_MARKET_SENTIMENT: usize = 25;
    pub const RISK_APPETITE: usize = 26;

    // Slots 27..29 are reserved for future signals and stay zero.
}

/// Slot names, index-aligned with the `slot` constants.
pub const FEATURE_SLOT_NAMES: [&str; FEATURE_LEN] = [
    "creator_reputation",
    "quality_score",
    "rarity",
    "has_license",
    "is_verified",
    "views_norm",
    "likes_norm",
    "shares_norm",
    "hist_mean_price",
    "hist_max_price",
    "hist_price_std",
    "hist_count",
    "hist_mean_volume",
    "category_popularity",
    "category_volume_24h",
    "category_avg_price",
    "market_volatility",
    "market_sentiment",
    "seasonal_factor",
    "hour_of_day",
    "day_of_week",
    "bid_ask_spread",
    "order_book_depth",
    "trading_frequency",
    "crypto_market_cap",
    "nft_market_sentiment",
    "risk_appetite",
    "reserved_0",
    "reserved_1",
    "reserved_2",
];

/// Fixed-length, semantically addressed feature vector.
///
/// Immutable once built by the assembler. Every slot lies in [0, 1] by
/// construction (unbounded ratios are clamped during assembly).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_LEN]);

impl FeatureVector {
    pub fn new(slots: [f64; FEATURE_LEN]) -> Self {
        Self(slots)
    }

    /// Value at `index`. Panics if `index >= FEATURE_LEN`; callers
    /// address slots through the `slot` constants, which are in range by
    /// construction.
    pub fn get(&self, index: usize) -> f64 {
        debug_assert!(index < FEATURE_LEN, "feature index {} out of range", index);
        self.0[index]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }

    pub fn mean(&self) -> f64 {
        self.0.iter().sum::<f64>() / FEATURE_LEN as f64
    }

    /// Fraction of slots carrying a non-zero signal. Feeds the
    /// data-completeness term of the uncertainty model.
    pub fn non_zero_fraction(&self) -> f64 {
        let non_zero = self.0.iter().filter(|v| **v != 0.0).count();
        (non_zero as f64 / FEATURE_LEN as f64).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_names_align_with_length() {
        assert_eq!(FEATURE_SLOT_NAMES.len(), FEATURE_LEN);
        assert_eq!(FEATURE_SLOT_NAMES[slot::CREATOR_REPUTATION], "creator_reputation");
        assert_eq!(FEATURE_SLOT_NAMES[slot::RISK_APPETITE], "risk_appetite");
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_index_panics() {
        FeatureVector::new([0.0; FEATURE_LEN]).get(FEATURE_LEN);
    }

    #[test]
    fn test_mean_and_non_zero_fraction() {
        let mut slots = [0.0; FEATURE_LEN];
        slots[0] = 1.0;
        slots[1] = 0.5;
        let v = FeatureVector::new(slots);
        assert!((v.mean() - 1.5 / 30.0).abs() < 1e-12);
        assert!((v.non_zero_fraction() - 2.0 / 30.0).abs() < 1e-12);
    }
}
