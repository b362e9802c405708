use super::MarketData;
use crate::models::PriceBar;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Tries providers in order, returning the first success
///
/// Bars and spot prices keep separate orderings: the default feed prefers
/// Binance klines for history (real high/low/volume) and CoinGecko for spot.
pub struct FallbackFeed {
    bar_sources: Vec<Arc<dyn MarketData>>,
    spot_sources: Vec<Arc<dyn MarketData>>,
}

impl FallbackFeed {
    pub fn new(
        bar_sources: Vec<Arc<dyn MarketData>>,
        spot_sources: Vec<Arc<dyn MarketData>>,
    ) -> Self {
        Self {
            bar_sources,
            spot_sources,
        }
    }
}

#[async_trait]
impl MarketData for FallbackFeed {
    async fn recent_bars(&self, limit: usize) -> Result<Vec<PriceBar>> {
        let mut last_error = None;

        for source in &self.bar_sources {
            match source.recent_bars(limit).await {
                Ok(bars) => return Ok(bars),
                Err(e) => {
                    tracing::warn!("{} bars failed, trying next provider: {:#}", source.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("No bar providers configured")))
    }

    async fn spot_price(&self) -> Result<f64> {
        let mut last_error = None;

        for source in &self.spot_sources {
            match source.spot_price().await {
                Ok(price) => return Ok(price),
                Err(e) => {
                    tracing::warn!("{} spot failed, trying next provider: {:#}", source.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("No spot providers configured")))
    }

    fn name(&self) -> &str {
        "fallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::synthetic::{MarketScenario, SyntheticFeed};

    struct DownFeed;

    #[async_trait]
    impl MarketData for DownFeed {
        async fn recent_bars(&self, _limit: usize) -> Result<Vec<PriceBar>> {
            anyhow::bail!("provider down")
        }

        async fn spot_price(&self) -> Result<f64> {
            anyhow::bail!("provider down")
        }

        fn name(&self) -> &str {
            "down"
        }
    }

    #[tokio::test]
    async fn test_falls_through_to_next_provider() {
        let down: Arc<dyn MarketData> = Arc::new(DownFeed);
        let synth: Arc<dyn MarketData> =
            Arc::new(SyntheticFeed::new(1, MarketScenario::Sideways));

        let feed = FallbackFeed::new(
            vec![down.clone(), synth.clone()],
            vec![down.clone(), synth.clone()],
        );

        assert_eq!(feed.recent_bars(50).await.unwrap().len(), 50);
        assert!(feed.spot_price().await.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_all_providers_down_returns_last_error() {
        let down: Arc<dyn MarketData> = Arc::new(DownFeed);
        let feed = FallbackFeed::new(vec![down.clone()], vec![down]);

        let err = feed.recent_bars(10).await.unwrap_err();
        assert!(err.to_string().contains("provider down"));
        assert!(feed.spot_price().await.is_err());
    }

    #[tokio::test]
    async fn test_empty_feed_is_an_error() {
        let feed = FallbackFeed::new(vec![], vec![]);
        assert!(feed.recent_bars(10).await.is_err());
    }
}
