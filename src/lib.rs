// Core modules
pub mod api;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod notify;
pub mod persistence;
pub mod server;
pub mod signals;

// Re-export commonly used types
pub use api::MarketData;
pub use config::Settings;
pub use decision::DecisionEngine;
pub use engine::{Engine, SharedState};
pub use error::EngineError;
pub use models::*;

// Error handling
pub type Result<T> = std::result::Result<T, EngineError>;
