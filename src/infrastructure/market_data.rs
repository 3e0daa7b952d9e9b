use crate::domain::market::MarketSnapshot;
use crate::domain::ports::MarketDataProvider;
use crate::infrastructure::http_client::HttpClientFactory;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use tracing::debug;

/// Market data over HTTP: `GET {base_url}/market/{category}` returning a
/// JSON `MarketSnapshot` with any subset of fields present.
pub struct HttpMarketDataProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

impl HttpMarketDataProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MarketDataProvider for HttpMarketDataProvider {
    async fn get_snapshot(&self, category: &str) -> Result<MarketSnapshot> {
        let url = format!("{}/market/{}", self.base_url, category);
        debug!(%url, "fetching market snapshot");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("market data request failed")?
            .error_for_status()
            .context("market data provider returned an error status")?;

        response
            .json::<MarketSnapshot>()
            .await
            .context("failed to parse market snapshot")
    }
}
