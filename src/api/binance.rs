use super::http::{build_client, get_with_retry, RetryPolicy};
use super::MarketData;
use crate::models::PriceBar;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

const BINANCE_API_BASE: &str = "https://api.binance.com/api/v3";
const KLINE_INTERVAL: &str = "1m";
const MAX_KLINE_LIMIT: usize = 1000;

/// Binance spot REST client (klines + ticker)
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    base_url: String,
    symbol: String,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    price: String,
}

impl BinanceClient {
    pub fn new(symbol: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: BINANCE_API_BASE.to_string(),
            symbol: symbol.into(),
            retry: RetryPolicy::default(),
        })
    }

    /// Point the client at another host (mock servers, mirrors)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch the most recent 1-minute klines, oldest first
    pub async fn get_klines(&self, limit: usize) -> Result<Vec<PriceBar>> {
        let url = format!("{}/klines", self.base_url);
        let query = [
            ("symbol", self.symbol.clone()),
            ("interval", KLINE_INTERVAL.to_string()),
            ("limit", limit.clamp(1, MAX_KLINE_LIMIT).to_string()),
        ];

        let response =
            get_with_retry(&self.client, &url, &query, &[], None, self.retry, "Binance").await?;

        let rows: Vec<Vec<serde_json::Value>> =
            response.json().await.context("Failed to parse Binance klines")?;

        let bars = rows
            .iter()
            .map(|row| parse_kline(row))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Fetched {} klines for {}", bars.len(), self.symbol);

        Ok(bars)
    }

    /// Fetch the latest traded price
    pub async fn get_ticker_price(&self) -> Result<f64> {
        let url = format!("{}/ticker/price", self.base_url);
        let query = [("symbol", self.symbol.clone())];

        let response =
            get_with_retry(&self.client, &url, &query, &[], None, self.retry, "Binance").await?;

        let ticker: TickerResponse =
            response.json().await.context("Failed to parse Binance ticker")?;

        ticker
            .price
            .parse::<f64>()
            .with_context(|| format!("Invalid Binance price '{}'", ticker.price))
    }
}

/// Kline layout: [open_time, open, high, low, close, volume, close_time, ...]
fn parse_kline(row: &[serde_json::Value]) -> Result<PriceBar> {
    if row.len() < 6 {
        anyhow::bail!("Kline row has {} fields, expected at least 6", row.len());
    }

    let open_time_ms = row[0]
        .as_i64()
        .context("Kline open time is not an integer")?;
    let timestamp = Utc
        .timestamp_millis_opt(open_time_ms)
        .single()
        .with_context(|| format!("Kline open time {} out of range", open_time_ms))?;

    Ok(PriceBar {
        timestamp,
        high: parse_decimal(&row[2], "high")?,
        low: parse_decimal(&row[3], "low")?,
        close: parse_decimal(&row[4], "close")?,
        volume: parse_decimal(&row[5], "volume")?,
    })
}

/// Binance sends decimals as JSON strings
fn parse_decimal(value: &serde_json::Value, field: &str) -> Result<f64> {
    match value {
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("Invalid kline {} '{}'", field, s)),
        serde_json::Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("Invalid kline {}", field)),
        other => anyhow::bail!("Unexpected kline {} value: {}", field, other),
    }
}

#[async_trait]
impl MarketData for BinanceClient {
    async fn recent_bars(&self, limit: usize) -> Result<Vec<PriceBar>> {
        self.get_klines(limit).await
    }

    async fn spot_price(&self) -> Result<f64> {
        self.get_ticker_price().await
    }

    fn name(&self) -> &str {
        "binance"
    }
}
