use super::http::{
    build_client, get_with_retry, per_minute_limiter, DirectRateLimiter, RetryPolicy,
};
use super::MarketData;
use crate::models::PriceBar;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";
const RATE_LIMIT_RPM: u32 = 30; // Demo API: 30 requests per minute
const VS_CURRENCY: &str = "usd";

/// CoinGecko API client with rate limiting
///
/// This struct is cloneable to allow sharing across async tasks.
/// All clones share the same rate limiter.
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    coin_id: String,
    api_key: Option<String>,
    rate_limiter: Arc<DirectRateLimiter>,
    retry: RetryPolicy,
}

/// Response from /market_chart endpoint
#[derive(Debug, Deserialize)]
pub struct MarketChartData {
    pub prices: Vec<[f64; 2]>,        // [timestamp_ms, price]
    #[serde(default)]
    pub total_volumes: Vec<[f64; 2]>, // [timestamp_ms, volume_24h]
}

impl MarketChartData {
    /// Convert the last `limit` price points into bars
    ///
    /// The chart carries close prices only, so high/low equal close. Volume is
    /// matched by exact timestamp and reads 0 when the point has none.
    pub fn into_bars(self, limit: usize) -> Vec<PriceBar> {
        let volumes: HashMap<i64, f64> = self
            .total_volumes
            .iter()
            .map(|v| (v[0] as i64, v[1]))
            .collect();

        let start = self.prices.len().saturating_sub(limit);

        self.prices[start..]
            .iter()
            .filter_map(|p| {
                let ts = p[0] as i64;
                let close = p[1];
                let timestamp = Utc.timestamp_millis_opt(ts).single()?;
                Some(PriceBar {
                    timestamp,
                    close,
                    high: close,
                    low: close,
                    volume: volumes.get(&ts).copied().unwrap_or(0.0),
                })
            })
            .collect()
    }
}

impl CoinGeckoClient {
    pub fn new(coin_id: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: COINGECKO_API_BASE.to_string(),
            coin_id: coin_id.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            rate_limiter: per_minute_limiter(RATE_LIMIT_RPM),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        self.api_key
            .iter()
            .map(|key| ("x-cg-demo-api-key", key.clone()))
            .collect()
    }

    /// Fetch market chart data (price and volume time series) for the last `days`
    pub async fn get_market_chart(&self, days: u32) -> Result<MarketChartData> {
        let url = format!("{}/coins/{}/market_chart", self.base_url, self.coin_id);
        let query = [
            ("vs_currency", VS_CURRENCY.to_string()),
            ("days", days.to_string()),
        ];

        tracing::debug!("Fetching market chart for {} ({}d)", self.coin_id, days);

        let response = get_with_retry(
            &self.client,
            &url,
            &query,
            &self.headers(),
            Some(self.rate_limiter.as_ref()),
            self.retry,
            "CoinGecko",
        )
        .await?;

        let data: MarketChartData = response
            .json()
            .await
            .context("Failed to parse market chart")?;

        tracing::debug!("Fetched {} price points for {}", data.prices.len(), self.coin_id);

        Ok(data)
    }

    /// Fetch the current USD price
    pub async fn get_simple_price(&self) -> Result<f64> {
        let url = format!("{}/simple/price", self.base_url);
        let query = [
            ("ids", self.coin_id.clone()),
            ("vs_currencies", VS_CURRENCY.to_string()),
        ];

        let response = get_with_retry(
            &self.client,
            &url,
            &query,
            &self.headers(),
            Some(self.rate_limiter.as_ref()),
            self.retry,
            "CoinGecko",
        )
        .await?;

        let prices: HashMap<String, HashMap<String, f64>> = response
            .json()
            .await
            .context("Failed to parse simple price")?;

        prices
            .get(&self.coin_id)
            .and_then(|quotes| quotes.get(VS_CURRENCY))
            .copied()
            .with_context(|| format!("No {} price for {}", VS_CURRENCY, self.coin_id))
    }
}

#[async_trait]
impl MarketData for CoinGeckoClient {
    async fn recent_bars(&self, limit: usize) -> Result<Vec<PriceBar>> {
        Ok(self.get_market_chart(1).await?.into_bars(limit))
    }

    async fn spot_price(&self) -> Result<f64> {
        self.get_simple_price().await
    }

    fn name(&self) -> &str {
        "coingecko"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> CoinGeckoClient {
        CoinGeckoClient::new("bitcoin", None)
            .unwrap()
            .with_base_url(server.url())
            .with_retry_policy(RetryPolicy::none())
    }

    #[test]
    fn test_into_bars_aligns_volume_by_timestamp() {
        let chart = MarketChartData {
            prices: vec![
                [1_700_000_000_000.0, 100.0],
                [1_700_000_060_000.0, 101.0],
                [1_700_000_120_000.0, 102.0],
            ],
            total_volumes: vec![[1_700_000_000_000.0, 5.0], [1_700_000_120_000.0, 7.0]],
        };

        let bars = chart.into_bars(10);
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].volume, 5.0);
        assert_eq!(bars[1].volume, 0.0); // no volume at that timestamp
        assert_eq!(bars[2].volume, 7.0);
        assert_eq!(bars[2].high, 102.0);
        assert_eq!(bars[2].low, 102.0);
    }

    #[test]
    fn test_into_bars_keeps_most_recent() {
        let chart = MarketChartData {
            prices: (0..10)
                .map(|i| [1_700_000_000_000.0 + i as f64 * 60_000.0, 100.0 + i as f64])
                .collect(),
            total_volumes: vec![],
        };

        let bars = chart.into_bars(3);
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].close, 107.0);
        assert_eq!(bars[2].close, 109.0);
    }

    #[tokio::test]
    async fn test_get_simple_price() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/simple/price")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("ids".into(), "bitcoin".into()),
                Matcher::UrlEncoded("vs_currencies".into(), "usd".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"bitcoin":{"usd":64000.5}}"#)
            .create_async()
            .await;

        let price = client_for(&server).get_simple_price().await.unwrap();
        assert_eq!(price, 64000.5);
    }

    #[tokio::test]
    async fn test_simple_price_missing_coin() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/simple/price")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{}"#)
            .create_async()
            .await;

        let result = client_for(&server).get_simple_price().await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("bitcoin"));
    }

    #[tokio::test]
    async fn test_recent_bars_from_market_chart() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/coins/bitcoin/market_chart")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"prices":[[1700000000000,100.0],[1700000060000,101.0]],
                    "total_volumes":[[1700000000000,9.0],[1700000060000,11.0]]}"#,
            )
            .create_async()
            .await;

        let bars = client_for(&server).recent_bars(240).await.unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 101.0);
        assert_eq!(bars[1].volume, 11.0);
    }

    #[tokio::test]
    async fn test_api_key_sent_as_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/simple/price")
            .match_query(Matcher::Any)
            .match_header("x-cg-demo-api-key", "demo-key")
            .with_status(200)
            .with_body(r#"{"bitcoin":{"usd":1.0}}"#)
            .create_async()
            .await;

        let client = CoinGeckoClient::new("bitcoin", Some("demo-key".to_string()))
            .unwrap()
            .with_base_url(server.url())
            .with_retry_policy(RetryPolicy::none());

        client.get_simple_price().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    #[ignore] // Requires network
    async fn test_get_market_chart_live() {
        let client = CoinGeckoClient::new("bitcoin", std::env::var("COINGECKO_API_KEY").ok())
            .unwrap();

        let data = client.get_market_chart(1).await.unwrap();
        assert!(data.prices.len() > 200);
        assert!(data.prices[0][1] > 0.0);
    }
}
