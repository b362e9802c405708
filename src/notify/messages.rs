use crate::execution::{ClosedPosition, ExitReason, OpenPosition};

pub fn startup(asset: &str, spot: Option<f64>) -> String {
    match spot {
        Some(price) => format!("✅ signalbot started for {}. Spot ${:.2}", asset, price),
        None => format!("✅ signalbot started for {}.", asset),
    }
}

pub fn position_opened(asset: &str, position: &OpenPosition) -> String {
    format!(
        "🚀 {} Signal\nEntry: ${:.2}\nSL: ${:.2}\nTP: ${:.2}\nRR: {:.2}\nConf: {:.0}%",
        asset,
        position.entry,
        position.stop_loss,
        position.take_profit,
        position.rr,
        position.confidence * 100.0
    )
}

/// Reports the move to the exit level that was hit
pub fn position_closed(closed: &ClosedPosition) -> String {
    let position = &closed.position;
    match closed.reason {
        ExitReason::TakeProfit => format!(
            "✅ TP hit: +{:.2}%",
            (position.take_profit - position.entry) / position.entry * 100.0
        ),
        ExitReason::StopLoss => format!(
            "❌ SL hit: {:.2}%",
            (position.stop_loss - position.entry) / position.entry * 100.0
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::PositionTracker;
    use crate::models::{ModuleScores, TradePlan};

    fn tracker_with_position() -> PositionTracker {
        let mut tracker = PositionTracker::new();
        tracker
            .open(
                TradePlan {
                    entry: 100.0,
                    stop_loss: 98.5,
                    take_profit: 103.0,
                    rr: 2.0,
                },
                0.812,
                ModuleScores::new(),
            )
            .unwrap();
        tracker
    }

    #[test]
    fn test_open_message() {
        let tracker = tracker_with_position();
        let msg = position_opened("BTC", tracker.open_position().unwrap());

        assert_eq!(
            msg,
            "🚀 BTC Signal\nEntry: $100.00\nSL: $98.50\nTP: $103.00\nRR: 2.00\nConf: 81%"
        );
    }

    #[test]
    fn test_close_messages() {
        let mut tracker = tracker_with_position();
        let closed = tracker.close(103.4, ExitReason::TakeProfit).unwrap();
        assert_eq!(position_closed(&closed), "✅ TP hit: +3.00%");

        let mut tracker = tracker_with_position();
        let closed = tracker.close(98.0, ExitReason::StopLoss).unwrap();
        assert_eq!(position_closed(&closed), "❌ SL hit: -1.50%");
    }

    #[test]
    fn test_startup_message() {
        assert!(startup("BTC", Some(64000.0)).contains("$64000.00"));
        assert!(startup("BTC", None).ends_with("BTC."));
    }
}
