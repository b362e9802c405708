use super::MarketData;
use crate::models::PriceBar;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;

const HISTORY_BARS: usize = 1000;
const BAR_MINUTES: i64 = 1;

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Steady uptrend with noise (+0.01% per bar)
    Uptrend,
    /// Steady downtrend with noise (-0.01% per bar)
    Downtrend,
    /// Sideways/choppy market (mean-reverting around the base price)
    Sideways,
    /// High volatility (large swings)
    Volatile,
}

struct FeedState {
    rng: StdRng,
    bars: VecDeque<PriceBar>,
}

/// Seeded random-walk feed for offline runs
///
/// Every `recent_bars` call appends one fresh bar, so consecutive cycles see
/// a moving market.
pub struct SyntheticFeed {
    scenario: MarketScenario,
    base_price: f64,
    base_volume: f64,
    state: Mutex<FeedState>,
}

impl SyntheticFeed {
    /// Create a new feed with a seed for reproducibility
    pub fn new(seed: u64, scenario: MarketScenario) -> Self {
        let base_price = 60_000.0;
        let base_volume = 25.0;

        let mut state = FeedState {
            rng: StdRng::seed_from_u64(seed),
            bars: VecDeque::with_capacity(HISTORY_BARS + 1),
        };

        let start = Utc::now() - Duration::minutes(HISTORY_BARS as i64 * BAR_MINUTES);
        let mut price = base_price;
        for i in 0..HISTORY_BARS {
            let timestamp = start + Duration::minutes(i as i64 * BAR_MINUTES);
            price = next_price(&mut state.rng, scenario, price, base_price);
            let bar = create_bar(&mut state.rng, price, base_volume, timestamp);
            state.bars.push_back(bar);
        }

        Self {
            scenario,
            base_price,
            base_volume,
            state: Mutex::new(state),
        }
    }

    fn advance(&self, state: &mut FeedState) {
        let (last_price, last_time) = match state.bars.back() {
            Some(bar) => (bar.close, bar.timestamp),
            None => (self.base_price, Utc::now()),
        };

        let price = next_price(&mut state.rng, self.scenario, last_price, self.base_price);
        let timestamp = last_time + Duration::minutes(BAR_MINUTES);
        let bar = create_bar(&mut state.rng, price, self.base_volume, timestamp);

        state.bars.push_back(bar);
        while state.bars.len() > HISTORY_BARS {
            state.bars.pop_front();
        }
    }
}

fn next_price(rng: &mut StdRng, scenario: MarketScenario, price: f64, base_price: f64) -> f64 {
    let drift_per_bar = 0.0001;

    let next = match scenario {
        MarketScenario::Uptrend => {
            price + price * drift_per_bar + price * rng.gen_range(-0.0005..0.0005)
        }
        MarketScenario::Downtrend => {
            price - price * drift_per_bar + price * rng.gen_range(-0.0005..0.0005)
        }
        MarketScenario::Sideways => {
            let reversion = (base_price - price) * 0.1; // 10% pull to mean
            price + reversion + price * rng.gen_range(-0.003..0.003)
        }
        MarketScenario::Volatile => price + price * rng.gen_range(-0.02..0.02),
    };

    // Prevent price from going too low
    next.max(base_price * 0.5)
}

fn create_bar(
    rng: &mut StdRng,
    price: f64,
    base_volume: f64,
    timestamp: DateTime<Utc>,
) -> PriceBar {
    let noise_pct = 0.002; // +/-0.2% intrabar movement

    PriceBar {
        timestamp,
        close: price,
        high: price * (1.0 + rng.gen_range(0.0..noise_pct)),
        low: price * (1.0 - rng.gen_range(0.0..noise_pct)),
        volume: base_volume * rng.gen_range(0.7..1.3),
    }
}

#[async_trait]
impl MarketData for SyntheticFeed {
    async fn recent_bars(&self, limit: usize) -> Result<Vec<PriceBar>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("synthetic feed state poisoned"))?;

        self.advance(&mut state);

        let skip = state.bars.len().saturating_sub(limit);
        Ok(state.bars.iter().skip(skip).cloned().collect())
    }

    async fn spot_price(&self) -> Result<f64> {
        let state = self
            .state
            .lock()
            .map_err(|_| anyhow::anyhow!("synthetic feed state poisoned"))?;

        state
            .bars
            .back()
            .map(|bar| bar.close)
            .ok_or_else(|| anyhow::anyhow!("synthetic feed has no bars"))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
