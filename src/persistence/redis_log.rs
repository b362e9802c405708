use super::TradeLog;
use crate::models::TradeRecord;
use anyhow::Context;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::time::{timeout, Duration};

/// Redis-backed trade log
///
/// Uses a sorted set `trades:{asset}` scored by open time in milliseconds.
pub struct RedisTradeLog {
    conn: ConnectionManager,
    key: String,
}

impl RedisTradeLog {
    /// Connect to Redis
    ///
    /// # Arguments
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    /// * `asset` - Asset label used in the key
    pub async fn connect(redis_url: &str, asset: &str) -> anyhow::Result<Self> {
        let client = Client::open(redis_url).context("Invalid Redis URL")?;

        // Add 5 second timeout to connection attempt
        let conn = timeout(Duration::from_secs(5), ConnectionManager::new(client))
            .await
            .map_err(|_| anyhow::anyhow!("Redis connection timeout after 5 seconds"))?
            .context("Failed to connect to Redis")?;

        tracing::info!("Connected to Redis at {}", redis_url);

        Ok(Self {
            conn,
            key: format!("trades:{}", asset.to_lowercase()),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Number of stored records
    pub async fn count(&self) -> anyhow::Result<usize> {
        let mut conn = self.conn.clone();
        Ok(conn.zcard(&self.key).await?)
    }
}

#[async_trait]
impl TradeLog for RedisTradeLog {
    async fn log_open(&self, record: &TradeRecord) -> anyhow::Result<()> {
        let value = serde_json::to_string(record)?;
        let score = record.timestamp.timestamp_millis() as f64;

        let mut conn = self.conn.clone();
        conn.zadd::<_, _, _, ()>(&self.key, value, score).await?;

        tracing::debug!("Logged trade {} to {}", record.id, self.key);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<TradeRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.conn.clone();
        let results: Vec<String> = conn
            .zrevrange(&self.key, 0, limit as isize - 1)
            .await?;

        results
            .iter()
            .map(|json| serde_json::from_str(json).context("Corrupt trade record"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModuleScores, Side};
    use chrono::{Duration as ChronoDuration, Utc};
    use uuid::Uuid;

    fn record(minutes_ago: i64, entry: f64) -> TradeRecord {
        TradeRecord {
            id: Uuid::new_v4(),
            timestamp: Utc::now() - ChronoDuration::minutes(minutes_ago),
            side: Side::Long,
            entry,
            stop_loss: entry * 0.98,
            take_profit: entry * 1.04,
            rr: 2.0,
            confidence: 0.8,
            modules: ModuleScores::new(),
        }
    }

    #[tokio::test]
    #[ignore] // Requires network timeout behaviour
    async fn test_connection_timeout() {
        let result = RedisTradeLog::connect("redis://192.0.2.1:6379", "BTC").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_log_and_read_back() {
        let log = RedisTradeLog::connect("redis://127.0.0.1:6379", "TEST_TRADES")
            .await
            .expect("Failed to connect to Redis");

        let mut conn = log.conn.clone();
        let _: () = conn.del(log.key()).await.unwrap();

        log.log_open(&record(2, 100.0)).await.unwrap();
        log.log_open(&record(1, 101.0)).await.unwrap();

        let recent = log.recent(30).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].entry, 101.0); // most recent first
        assert_eq!(log.count().await.unwrap(), 2);

        let _: () = conn.del(log.key()).await.unwrap();
    }
}
