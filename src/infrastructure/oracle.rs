use crate::domain::ports::OracleSink;
use crate::infrastructure::http_client::HttpClientFactory;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    tx_id: Option<String>,
}

/// On-chain oracle bridge over HTTP:
/// `POST {base_url}/oracle/valuations` with the valuation payload. The
/// bridge answers with the transaction id once the update is queued.
pub struct HttpOracleSink {
    client: ClientWithMiddleware,
    base_url: String,
}

impl HttpOracleSink {
    pub fn new(base_url: String) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl OracleSink for HttpOracleSink {
    async fn submit(
        &self,
        token_id: u64,
        value: f64,
        confidence: f64,
        metadata: serde_json::Value,
    ) -> Result<Option<String>> {
        let url = format!("{}/oracle/valuations", self.base_url);
        debug!(%url, token_id, "submitting valuation to oracle");

        let body = serde_json::json!({
            "token_id": token_id,
            "value": value,
            "confidence": confidence,
            "metadata": metadata,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("oracle submission request failed")?
            .error_for_status()
            .context("oracle bridge returned an error status")?;

        let parsed = response
            .json::<SubmitResponse>()
            .await
            .context("failed to parse oracle response")?;
        Ok(parsed.tx_id)
    }
}
