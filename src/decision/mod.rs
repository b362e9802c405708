// Decision engine module
// Weighted logistic aggregation of module scores, labels, trade plans and
// the adaptive weight feedback
pub mod engine;
pub mod feedback;

pub use engine::{label_from_conf, DecisionConfig, DecisionEngine, Evaluation, Weights};
pub use feedback::Outcome;
