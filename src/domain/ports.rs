use crate::domain::asset::{AssetDescriptor, HistoricalSale};
use crate::domain::market::MarketSnapshot;
use anyhow::Result;
use async_trait::async_trait;

/// Market conditions collaborator. Best-effort: any error is replaced by
/// an empty snapshot (neutral defaults) at the call site.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn get_snapshot(&self, category: &str) -> Result<MarketSnapshot>;
}

/// Comparable-sales collaborator, consulted only when the caller supplies
/// no historical sales of its own.
#[async_trait]
pub trait ComparableSalesProvider: Send + Sync {
    async fn fetch(&self, asset: &AssetDescriptor) -> Result<Vec<HistoricalSale>>;
}

/// Oracle submission collaborator. Fire-and-forget: returns the
/// transaction id when the sink accepted the valuation, `None` when the
/// sink is not configured for the asset. Failure must never fail a
/// valuation.
#[async_trait]
pub trait OracleSink: Send + Sync {
    async fn submit(
        &self,
        token_id: u64,
        value: f64,
        confidence: f64,
        metadata: serde_json::Value,
    ) -> Result<Option<String>>;
}
