// Notification delivery
pub mod messages;
pub mod telegram;

pub use telegram::TelegramNotifier;

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

/// Delivers human-readable messages somewhere
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, message: &str) -> anyhow::Result<()>;

    fn name(&self) -> &str;
}

/// Writes messages to the log only
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_text(&self, message: &str) -> anyhow::Result<()> {
        tracing::info!("📣 {}", message.replace('\n', " | "));
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Keeps every message in memory; used by tests and dry runs
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, message: &str) -> anyhow::Result<()> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
