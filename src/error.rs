use thiserror::Error;

/// Engine error taxonomy. None of these are fatal to the process.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Provider/network failure; the cycle is skipped
    #[error("data fetch failed: {0:#}")]
    DataFetch(anyhow::Error),

    /// Not enough history to produce a complete indicator row
    #[error("computation failed: {0}")]
    Computation(String),

    #[error("notification failed: {0:#}")]
    Notification(anyhow::Error),

    #[error("trade log failed: {0:#}")]
    TradeLog(anyhow::Error),

    /// Feedback requires exactly one of take-profit / stop-loss
    #[error("invalid trade outcome (take_profit={hit_take_profit}, stop_loss={hit_stop_loss})")]
    InvalidOutcome {
        hit_take_profit: bool,
        hit_stop_loss: bool,
    },

    #[error("configuration error: {0}")]
    Config(String),
}
