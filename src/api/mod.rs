pub mod binance;
pub mod coingecko;
pub mod fallback;
pub mod http;
pub mod synthetic;

pub use binance::BinanceClient;
pub use coingecko::{CoinGeckoClient, MarketChartData};
pub use fallback::FallbackFeed;
pub use http::RetryPolicy;
pub use synthetic::{MarketScenario, SyntheticFeed};

use crate::config::{PriceProvider, Settings};
use crate::models::PriceBar;
use async_trait::async_trait;
use std::sync::Arc;

/// Supplier of recent market history for one asset
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Most recent bars, oldest first
    async fn recent_bars(&self, limit: usize) -> anyhow::Result<Vec<PriceBar>>;

    /// Latest traded/quoted price
    async fn spot_price(&self) -> anyhow::Result<f64>;

    /// Provider name for logs
    fn name(&self) -> &str;
}

/// Enforce strictly increasing timestamps and drop unusable bars
///
/// Bars with a non-finite or non-positive close are removed; for duplicate
/// timestamps the later bar wins.
pub fn normalize_bars(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.retain(|b| b.close.is_finite() && b.close > 0.0);
    bars.sort_by_key(|b| b.timestamp);

    let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            _ => out.push(bar),
        }
    }
    out
}

/// Build the configured market data provider
pub fn build_market_data(settings: &Settings) -> anyhow::Result<Arc<dyn MarketData>> {
    let feed: Arc<dyn MarketData> = match settings.provider {
        PriceProvider::Synthetic => Arc::new(SyntheticFeed::new(
            settings.synthetic_seed,
            MarketScenario::Sideways,
        )),
        PriceProvider::CoinGecko | PriceProvider::Binance => {
            let binance: Arc<dyn MarketData> =
                Arc::new(BinanceClient::new(settings.binance_symbol.clone())?);
            let coingecko: Arc<dyn MarketData> = Arc::new(CoinGeckoClient::new(
                settings.coingecko_coin_id.clone(),
                settings.coingecko_api_key.clone(),
            )?);

            // History always prefers Binance klines; the provider setting picks spot
            let spot_sources = if settings.provider == PriceProvider::CoinGecko {
                vec![coingecko.clone(), binance.clone()]
            } else {
                vec![binance.clone()]
            };

            Arc::new(FallbackFeed::new(vec![binance, coingecko], spot_sources))
        }
    };

    tracing::info!("Market data provider: {}", settings.provider);
    Ok(feed)
}
