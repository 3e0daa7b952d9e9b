use crate::domain::asset::{AssetDescriptor, HistoricalSale};
use crate::domain::ports::ComparableSalesProvider;
use crate::infrastructure::http_client::HttpClientFactory;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use tracing::debug;

/// Comparable sales over HTTP:
/// `GET {base_url}/sales?category=..&creator=..` returning a JSON array
/// of historical sales.
pub struct HttpComparableSalesProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

impl HttpComparableSalesProvider {
    pub fn new(base_url: String) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ComparableSalesProvider for HttpComparableSalesProvider {
    async fn fetch(&self, asset: &AssetDescriptor) -> Result<Vec<HistoricalSale>> {
        let url = format!("{}/sales", self.base_url);
        debug!(%url, category = %asset.category, "fetching comparable sales");

        let response = self
            .client
            .get(&url)
            .query(&[("category", asset.category.as_str()), ("creator", asset.creator.as_str())])
            .send()
            .await
            .context("comparable sales request failed")?
            .error_for_status()
            .context("comparable sales provider returned an error status")?;

        response
            .json::<Vec<HistoricalSale>>()
            .await
            .context("failed to parse comparable sales")
    }
}
