use super::TradeLog;
use crate::models::TradeRecord;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

const DEFAULT_CAPACITY: usize = 1000;

/// Bounded in-process trade log; the oldest records fall off first
#[derive(Debug)]
pub struct MemoryTradeLog {
    capacity: usize,
    records: Mutex<VecDeque<TradeRecord>>,
}

impl MemoryTradeLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: Mutex::new(VecDeque::new()),
        }
    }
}

impl Default for MemoryTradeLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TradeLog for MemoryTradeLog {
    async fn log_open(&self, record: &TradeRecord) -> anyhow::Result<()> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.push_back(record.clone());
        while records.len() > self.capacity {
            records.pop_front();
        }
        Ok(())
    }

    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<TradeRecord>> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}
