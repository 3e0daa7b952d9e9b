use crate::domain::asset::{AssetDescriptor, HistoricalSale};
use crate::domain::market::{LiquidityMetrics, MacroIndicators, MarketSnapshot};
use crate::domain::ports::{ComparableSalesProvider, MarketDataProvider, OracleSink};
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Canned market data for tests and the demo CLI path.
pub struct MockMarketDataProvider {
    snapshot: MarketSnapshot,
    fail: bool,
    calls: AtomicUsize,
}

impl MockMarketDataProvider {
    pub fn new(snapshot: MarketSnapshot) -> Self {
        Self { snapshot, fail: false, calls: AtomicUsize::new(0) }
    }

    pub fn failing() -> Self {
        Self {
            snapshot: MarketSnapshot::default(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// A snapshot with every field populated, for demo valuations.
    pub fn full() -> Self {
        Self::new(MarketSnapshot {
            category_popularity: None,
            category_volume_24h: Some(500_000.0),
            category_avg_price: Some(5_000.0),
            market_volatility: Some(0.15),
            market_sentiment: Some(0.65),
            seasonal_factor: Some(0.5),
            creator_reputation: None,
            liquidity: Some(LiquidityMetrics {
                bid_ask_spread: 0.08,
                order_book_depth: 0.6,
                trading_frequency: 0.4,
            }),
            macro_indicators: Some(MacroIndicators {
                crypto_market_cap: 0.6,
                nft_market_sentiment: 0.55,
                risk_appetite: 0.5,
            }),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketDataProvider {
    async fn get_snapshot(&self, _category: &str) -> Result<MarketSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("mock market data provider configured to fail");
        }
        Ok(self.snapshot.clone())
    }
}

/// Canned comparable sales for tests and demos.
pub struct MockComparableSalesProvider {
    sales: Vec<HistoricalSale>,
    fail: bool,
}

impl MockComparableSalesProvider {
    pub fn new(sales: Vec<HistoricalSale>) -> Self {
        Self { sales, fail: false }
    }

    pub fn failing() -> Self {
        Self { sales: Vec::new(), fail: true }
    }
}

#[async_trait]
impl ComparableSalesProvider for MockComparableSalesProvider {
    async fn fetch(&self, _asset: &AssetDescriptor) -> Result<Vec<HistoricalSale>> {
        if self.fail {
            bail!("mock comparable sales provider configured to fail");
        }
        Ok(self.sales.clone())
    }
}

/// Deterministic sample sales around a base price, seeded so tests and
/// the demo CLI produce stable output.
pub fn sample_sales(category: &str, base_price: f64, count: usize, seed: u64) -> Vec<HistoricalSale> {
    let mut rng = StdRng::seed_from_u64(seed);
    let now = Utc::now().timestamp();

    (0..count)
        .map(|i| {
            let spread: f64 = rng.random_range(0.7..1.3);
            HistoricalSale {
                price: base_price * spread,
                category: category.to_string(),
                creator: None,
                quality_score: rng.random_range(0.4..0.95),
                rarity: rng.random_range(0.2..0.9),
                timestamp: now - (i as i64 + 1) * 86_400,
                volume: Some(rng.random_range(50.0..500.0)),
                source: Some("sample".to_string()),
            }
        })
        .collect()
}

type RecordedSubmission = (u64, f64, f64, serde_json::Value);

/// Oracle sink that records submissions instead of sending them.
pub struct RecordingOracleSink {
    submissions: Mutex<Vec<RecordedSubmission>>,
    fail: bool,
}

impl RecordingOracleSink {
    pub fn new() -> Self {
        Self { submissions: Mutex::new(Vec::new()), fail: false }
    }

    pub fn failing() -> Self {
        Self { submissions: Mutex::new(Vec::new()), fail: true }
    }

    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        match self.submissions.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for RecordingOracleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OracleSink for RecordingOracleSink {
    async fn submit(
        &self,
        token_id: u64,
        value: f64,
        confidence: f64,
        metadata: serde_json::Value,
    ) -> Result<Option<String>> {
        if self.fail {
            bail!("mock oracle sink configured to fail");
        }
        let mut submissions = match self.submissions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        submissions.push((token_id, value, confidence, metadata));
        Ok(Some(format!("0xmock{:08x}", token_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_sales_are_deterministic() {
        let a = sample_sales("music", 5_000.0, 5, 42);
        let b = sample_sales("music", 5_000.0, 5, 42);
        assert_eq!(a.len(), 5);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.price, y.price);
            assert_eq!(x.quality_score, y.quality_score);
        }
    }

    #[tokio::test]
    async fn test_recording_sink_captures_submissions() {
        let sink = RecordingOracleSink::new();
        let tx = sink
            .submit(7, 5_000.0, 0.6, serde_json::json!({"category": "music"}))
            .await
            .unwrap();
        assert!(tx.unwrap().starts_with("0xmock"));
        let recorded = sink.submissions();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0, 7);
    }

    #[tokio::test]
    async fn test_failing_providers_error() {
        let market = MockMarketDataProvider::failing();
        assert!(market.get_snapshot("music").await.is_err());

        let sink = RecordingOracleSink::failing();
        assert!(sink.submit(1, 1.0, 0.5, serde_json::Value::Null).await.is_err());
        assert!(sink.submissions().is_empty());
    }
}
