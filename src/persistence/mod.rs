// Trade history persistence
pub mod memory;
pub mod redis_log;

pub use memory::MemoryTradeLog;
pub use redis_log::RedisTradeLog;

use crate::models::TradeRecord;
use async_trait::async_trait;

/// Append-only log of opened trades
#[async_trait]
pub trait TradeLog: Send + Sync {
    /// Append a record
    async fn log_open(&self, record: &TradeRecord) -> anyhow::Result<()>;

    /// Up to `limit` records, most recent first
    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<TradeRecord>>;
}
