//! Runtime configuration
//!
//! Environment variables (optionally from `.env`) are read through the
//! `config` crate; CLI flags override them.

use crate::error::EngineError;
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which market data provider feeds the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PriceProvider {
    /// Binance history, CoinGecko spot with Binance fallback
    #[value(name = "coingecko")]
    CoinGecko,
    /// Binance history and spot
    Binance,
    /// Seeded offline random walk
    Synthetic,
}

impl FromStr for PriceProvider {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coingecko" => Ok(PriceProvider::CoinGecko),
            "binance" => Ok(PriceProvider::Binance),
            "synthetic" => Ok(PriceProvider::Synthetic),
            other => Err(EngineError::Config(format!("unknown price provider '{}'", other))),
        }
    }
}

impl fmt::Display for PriceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceProvider::CoinGecko => f.write_str("coingecko"),
            PriceProvider::Binance => f.write_str("binance"),
            PriceProvider::Synthetic => f.write_str("synthetic"),
        }
    }
}

/// Raw environment view, everything optional-friendly
#[derive(Debug, Deserialize)]
struct RawSettings {
    poll_interval: f64,
    manual_rr: Option<String>,
    price_provider: String,
    bar_limit: usize,
    binance_symbol: String,
    coingecko_coin_id: String,
    coingecko_api_key: Option<String>,
    port: u16,
    redis_url: Option<String>,
    telegram_bot_token: Option<String>,
    telegram_chat_id: Option<String>,
    asset_label: String,
    synthetic_seed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub poll_interval: Duration,
    /// Fixed risk/reward; None means derive it from volatility
    pub manual_rr: Option<f64>,
    pub provider: PriceProvider,
    pub bar_limit: usize,
    pub binance_symbol: String,
    pub coingecko_coin_id: String,
    pub coingecko_api_key: Option<String>,
    pub port: u16,
    pub redis_url: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub asset_label: String,
    pub synthetic_seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            manual_rr: None,
            provider: PriceProvider::CoinGecko,
            bar_limit: 240,
            binance_symbol: "BTCUSDT".to_string(),
            coingecko_coin_id: "bitcoin".to_string(),
            coingecko_api_key: None,
            port: 8000,
            redis_url: None,
            telegram_bot_token: None,
            telegram_chat_id: None,
            asset_label: "BTC".to_string(),
            synthetic_seed: 42,
        }
    }
}

/// Command line overrides
#[derive(Debug, Default, Parser)]
#[command(name = "signalbot", about = "Adaptive market-signal engine")]
pub struct Cli {
    /// Seconds between engine cycles
    #[arg(long)]
    pub poll_interval: Option<f64>,

    /// Fixed risk/reward ratio (disables auto selection)
    #[arg(long)]
    pub manual_rr: Option<f64>,

    /// Market data provider
    #[arg(long, value_enum)]
    pub provider: Option<PriceProvider>,

    /// HTTP port for the read API
    #[arg(long)]
    pub port: Option<u16>,
}

impl Settings {
    /// Load from the process environment
    pub fn load() -> Result<Self, EngineError> {
        Self::from_environment(config::Environment::default().try_parsing(true))
    }

    /// Load from an explicit variable map (keys as they would appear in the environment)
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, EngineError> {
        Self::from_environment(
            config::Environment::default()
                .try_parsing(true)
                .source(Some(vars)),
        )
    }

    fn from_environment(env: config::Environment) -> Result<Self, EngineError> {
        let defaults = Settings::default();

        let raw: RawSettings = config::Config::builder()
            .set_default("poll_interval", 2.0)
            .and_then(|b| b.set_default("price_provider", defaults.provider.to_string()))
            .and_then(|b| b.set_default("bar_limit", defaults.bar_limit as i64))
            .and_then(|b| b.set_default("binance_symbol", defaults.binance_symbol.clone()))
            .and_then(|b| b.set_default("coingecko_coin_id", defaults.coingecko_coin_id.clone()))
            .and_then(|b| b.set_default("port", defaults.port as i64))
            .and_then(|b| b.set_default("asset_label", defaults.asset_label.clone()))
            .and_then(|b| b.set_default("synthetic_seed", defaults.synthetic_seed as i64))
            .map_err(|e| EngineError::Config(e.to_string()))?
            .add_source(env)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| EngineError::Config(e.to_string()))?;

        raw.try_into()
    }

    /// Apply CLI flags on top of the environment
    pub fn with_cli(mut self, cli: &Cli) -> Result<Self, EngineError> {
        if let Some(secs) = cli.poll_interval {
            self.poll_interval = parse_poll_interval(secs)?;
        }
        if let Some(rr) = cli.manual_rr {
            self.manual_rr = Some(validate_rr(rr)?);
        }
        if let Some(provider) = cli.provider {
            self.provider = provider;
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        Ok(self)
    }

    /// Telegram credentials when both parts are configured
    pub fn telegram(&self) -> Option<(&str, &str)> {
        match (&self.telegram_bot_token, &self.telegram_chat_id) {
            (Some(token), Some(chat)) => Some((token.as_str(), chat.as_str())),
            _ => None,
        }
    }
}

impl TryFrom<RawSettings> for Settings {
    type Error = EngineError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let manual_rr = match non_blank(raw.manual_rr) {
            Some(value) => {
                let rr = value.trim().parse::<f64>().map_err(|_| {
                    EngineError::Config(format!("MANUAL_RR '{}' is not a number", value))
                })?;
                Some(validate_rr(rr)?)
            }
            None => None,
        };

        if raw.bar_limit == 0 {
            return Err(EngineError::Config("BAR_LIMIT must be positive".to_string()));
        }

        Ok(Self {
            poll_interval: parse_poll_interval(raw.poll_interval)?,
            manual_rr,
            provider: raw.price_provider.parse()?,
            bar_limit: raw.bar_limit,
            binance_symbol: raw.binance_symbol.to_uppercase(),
            coingecko_coin_id: raw.coingecko_coin_id,
            coingecko_api_key: non_blank(raw.coingecko_api_key),
            port: raw.port,
            redis_url: non_blank(raw.redis_url),
            telegram_bot_token: non_blank(raw.telegram_bot_token),
            telegram_chat_id: non_blank(raw.telegram_chat_id),
            asset_label: raw.asset_label,
            synthetic_seed: raw.synthetic_seed,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_poll_interval(secs: f64) -> Result<Duration, EngineError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(EngineError::Config(format!(
            "POLL_INTERVAL must be a positive number of seconds, got {}",
            secs
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn validate_rr(rr: f64) -> Result<f64, EngineError> {
    if !rr.is_finite() || rr <= 0.0 {
        return Err(EngineError::Config(format!(
            "risk/reward must be a positive number, got {}",
            rr
        )));
    }
    Ok(rr)
}
