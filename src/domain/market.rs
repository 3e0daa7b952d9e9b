use serde::{Deserialize, Serialize};

/// Liquidity metrics for a category, as reported by the market data
/// provider. All values normalized to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidityMetrics {
    pub bid_ask_spread: f64,
    pub order_book_depth: f64,
    pub trading_frequency: f64,
}

/// Macro market indicators, normalized to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroIndicators {
    pub crypto_market_cap: f64,
    pub nft_market_sentiment: f64,
    pub risk_appetite: f64,
}

/// Point-in-time view of market conditions for one category.
///
/// Every field is optional: the market data provider is a best-effort
/// collaborator and absence of a field falls back to a documented
/// neutral default at feature-assembly time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    #[serde(default)]
    pub category_popularity: Option<f64>,
    #[serde(default)]
    pub category_volume_24h: Option<f64>,
    #[serde(default)]
    pub category_avg_price: Option<f64>,
    #[serde(default)]
    pub market_volatility: Option<f64>,
    #[serde(default)]
    pub market_sentiment: Option<f64>,
    #[serde(default)]
    pub seasonal_factor: Option<f64>,
    /// Reputation of the asset's creator, when the provider tracks it.
    #[serde(default)]
    pub creator_reputation: Option<f64>,
    #[serde(default)]
    pub liquidity: Option<LiquidityMetrics>,
    #[serde(default)]
    pub macro_indicators: Option<MacroIndicators>,
}

/// The six market-data fields whose presence feeds the data-completeness
/// term of the uncertainty model.
pub const EXPECTED_MARKET_FIELDS: usize = 6;

impl MarketSnapshot {
    /// Fraction of the six expected market-data fields that are present,
    /// clamped to [0, 1].
    pub fn present_field_fraction(&self) -> f64 {
        let present = [
            self.category_volume_24h.is_some(),
            self.category_avg_price.is_some(),
            self.market_volatility.is_some(),
            self.market_sentiment.is_some(),
            self.liquidity.is_some(),
            self.macro_indicators.is_some(),
        ]
        .iter()
        .filter(|p| **p)
        .count();

        (present as f64 / EXPECTED_MARKET_FIELDS as f64).clamp(0.0, 1.0)
    }
}

/// Static category popularity table, used when the snapshot does not
/// carry a live `category_popularity` figure. Unknown categories score
/// neutral 0.5.
pub fn default_category_popularity(category: &str) -> f64 {
    match category.to_ascii_lowercase().as_str() {
        "music" => 0.85,
        "video" => 0.80,
        "art" => 0.75,
        "course" => 0.70,
        "software" => 0.65,
        "ebook" => 0.60,
        _ => 0.5,
    }
}
