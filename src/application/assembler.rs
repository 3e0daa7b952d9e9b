use crate::domain::asset::{AssetDescriptor, HistoricalSale};
use crate::domain::features::{slot, FeatureVector, FEATURE_LEN};
use crate::domain::market::{default_category_popularity, MarketSnapshot};
use chrono::{DateTime, Datelike, Timelike, Utc};

// Documented neutral defaults for absent inputs.
const DEFAULT_CREATOR_REPUTATION: f64 = 0.5;
const DEFAULT_MARKET_VOLATILITY: f64 = 0.2;
const DEFAULT_MARKET_SENTIMENT: f64 = 0.6;
const DEFAULT_SEASONAL_FACTOR: f64 = 0.5;
const DEFAULT_BID_ASK_SPREAD: f64 = 0.1;
const DEFAULT_ORDER_BOOK_DEPTH: f64 = 0.5;
const DEFAULT_TRADING_FREQUENCY: f64 = 0.3;
const DEFAULT_MACRO: f64 = 0.5;

/// Historical slots when no sales are available:
/// [mean, max, std, count, volume].
const DEFAULT_HISTORICAL: [f64; 5] = [0.5, 0.5, 0.1, 0.1, 0.1];

/// Turns heterogeneous inputs into the fixed-length feature vector.
///
/// Pure function of its inputs (including the injected `now`); missing
/// data is substituted with neutral defaults, never an error.
pub struct FeatureAssembler;

impl FeatureAssembler {
    pub fn assemble(
        asset: &AssetDescriptor,
        historical: &[HistoricalSale],
        market: &MarketSnapshot,
        now: DateTime<Utc>,
    ) -> FeatureVector {
        let mut slots = [0.0_f64; FEATURE_LEN];

        // Creator / content
        slots[slot::CREATOR_REPUTATION] = market
            .creator_reputation
            .unwrap_or(DEFAULT_CREATOR_REPUTATION)
            .clamp(0.0, 1.0);
        slots[slot::QUALITY_SCORE] = asset.quality_score;
        slots[slot::RARITY] = asset.rarity;
        slots[slot::HAS_LICENSE] = if asset.has_license { 1.0 } else { 0.0 };
        slots[slot::IS_VERIFIED] = if asset.is_verified { 1.0 } else { 0.0 };
        slots[slot::VIEWS] = (asset.views as f64 / 10_000.0).min(1.0);
        slots[slot::LIKES] = (asset.likes as f64 / 1_000.0).min(1.0);
        slots[slot::SHARES] = (asset.shares as f64 / 500.0).min(1.0);

        // Historical performance
        let hist = Self::historical_slots(historical);
        slots[slot::HIST_MEAN_PRICE] = hist[0];
        slots[slot::HIST_MAX_PRICE] = hist[1];
        slots[slot::HIST_PRICE_STD] = hist[2];
        slots[slot::HIST_COUNT] = hist[3];
        slots[slot::HIST_MEAN_VOLUME] = hist[4];

        // Market / category
        slots[slot::CATEGORY_POPULARITY] = market
            .category_popularity
            .unwrap_or_else(|| default_category_popularity(&asset.category))
            .clamp(0.0, 1.0);
        slots[slot::CATEGORY_VOLUME_24H] = market
            .category_volume_24h
            .map(|v| (v / 1_000_000.0).clamp(0.0, 1.0))
            .unwrap_or(0.0);
        slots[slot::CATEGORY_AVG_PRICE] = market
            .category_avg_price
            .map(|p| (p / 10_000.0).clamp(0.0, 1.0))
            .unwrap_or(0.0);
        slots[slot::MARKET_VOLATILITY] = market
            .market_volatility
            .unwrap_or(DEFAULT_MARKET_VOLATILITY)
            .clamp(0.0, 1.0);

        // Temporal
        slots[slot::MARKET_SENTIMENT] = market
            .market_sentiment
            .unwrap_or(DEFAULT_MARKET_SENTIMENT)
            .clamp(0.0, 1.0);
        slots[slot::SEASONAL_FACTOR] = market
            .seasonal_factor
            .unwrap_or(DEFAULT_SEASONAL_FACTOR)
            .clamp(0.0, 1.0);
        slots[slot::HOUR_OF_DAY] = now.hour() as f64 / 24.0;
        slots[slot::DAY_OF_WEEK] = now.weekday().num_days_from_monday() as f64 / 7.0;

        // Liquidity
        let (spread, depth, freq) = market
            .liquidity
            .map(|l| (l.bid_ask_spread, l.order_book_depth, l.trading_frequency))
            .unwrap_or((
                DEFAULT_BID_ASK_SPREAD,
                DEFAULT_ORDER_BOOK_DEPTH,
                DEFAULT_TRADING_FREQUENCY,
            ));
        slots[slot::BID_ASK_SPREAD] = spread.clamp(0.0, 1.0);
        slots[slot::ORDER_BOOK_DEPTH] = depth.clamp(0.0, 1.0);
        slots[slot::TRADING_FREQUENCY] = freq.clamp(0.0, 1.0);

        // Macro
        let (cap, nft_sentiment, risk) = market
            .macro_indicators
            .map(|m| (m.crypto_market_cap, m.nft_market_sentiment, m.risk_appetite))
            .unwrap_or((DEFAULT_MACRO, DEFAULT_MACRO, DEFAULT_MACRO));
        slots[slot::CRYPTO_MARKET_CAP] = cap.clamp(0.0, 1.0);
        slots[slot::NFT_MARKET_SENTIMENT] = nft_sentiment.clamp(0.0, 1.0);
        slots[slot::RISK_APPETITE] = risk.clamp(0.0, 1.0);

        FeatureVector::new(slots)
    }

    fn historical_slots(historical: &[HistoricalSale]) -> [f64; 5] {
        if historical.is_empty() {
            return DEFAULT_HISTORICAL;
        }

        let prices: Vec<f64> = historical.iter().map(|s| s.price).collect();
        let n = prices.len() as f64;
        let mean = prices.iter().sum::<f64>() / n;
        let max = prices.iter().cloned().fold(f64::MIN, f64::max);

        // Sample std; a single observation carries no spread signal.
        let std = if prices.len() >= 2 {
            let var = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / (n - 1.0);
            (var.sqrt() / 5_000.0).clamp(0.0, 1.0)
        } else {
            0.1
        };

        let volumes: Vec<f64> = historical.iter().filter_map(|s| s.volume).collect();
        let mean_volume = if volumes.is_empty() {
            0.1
        } else {
            (volumes.iter().sum::<f64>() / volumes.len() as f64).clamp(0.0, 1.0)
        };

        [
            (mean / 10_000.0).clamp(0.0, 1.0),
            (max / 50_000.0).clamp(0.0, 1.0),
            std,
            (n / 100.0).clamp(0.0, 1.0),
            mean_volume,
        ]
    }
}
