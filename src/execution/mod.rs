// Hypothetical position tracking
pub mod position_tracker;

pub use position_tracker::{ClosedPosition, ExitReason, OpenPosition, PositionTracker};
