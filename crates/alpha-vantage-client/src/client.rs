use analysis_core::{AnalysisError, MetricQuery, ProviderFunction, QuoteSource, Ticker};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::document::QuoteDocument;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Alpha Vantage `/query` client. One GET per call, no retries.
#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl fmt::Debug for AlphaVantageClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlphaVantageClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AlphaVantageClient {
    pub fn new(api_key: String) -> Result<Self, AnalysisError> {
        Self::with_options(api_key, DEFAULT_BASE_URL.to_string(), DEFAULT_TIMEOUT)
    }

    /// Create a client against a custom host (mirrors, local test servers).
    pub fn with_options(
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, AnalysisError> {
        if api_key.trim().is_empty() {
            return Err(AnalysisError::Config("Alpha Vantage API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch and parse the full response document for one ticker and endpoint mode.
    pub async fn fetch_document(
        &self,
        ticker: &Ticker,
        function: ProviderFunction,
    ) -> Result<QuoteDocument, AnalysisError> {
        let url = format!("{}/query", self.base_url);

        let network_failure = |message: String| AnalysisError::NetworkFailure {
            ticker: ticker.to_string(),
            message,
        };

        // without_url() keeps the apikey query parameter out of error text
        let response = self
            .client
            .get(&url)
            .query(&[
                ("function", function.as_str()),
                ("symbol", ticker.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| network_failure(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(network_failure(format!("HTTP {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| network_failure(format!("unreadable response body: {}", e.without_url())))?;

        tracing::debug!(ticker = %ticker, function = function.as_str(), "Alpha Vantage response received");

        Ok(QuoteDocument::new(body))
    }
}

#[async_trait]
impl QuoteSource for AlphaVantageClient {
    async fn fetch(&self, query: &MetricQuery) -> Result<Value, AnalysisError> {
        let document = self.fetch_document(&query.ticker, query.function).await?;
        document.lookup(query).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_key() {
        let client = AlphaVantageClient::new("SECRET123".to_string()).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("SECRET123"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_empty_key_rejected() {
        let err = AlphaVantageClient::new("  ".to_string()).unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = AlphaVantageClient::with_options(
            "k".to_string(),
            "http://127.0.0.1:9000/".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9000");
    }
}
