use crate::decision::Weights;
use crate::execution::OpenPosition;
use crate::models::EngineState;
use std::sync::{Arc, PoisonError, RwLock};

/// State shared between the engine loop (sole writer) and the read API
///
/// Each value is replaced wholesale behind its lock, so readers only ever
/// see a complete snapshot.
#[derive(Debug)]
pub struct SharedState {
    state: RwLock<Arc<EngineState>>,
    weights: RwLock<Arc<Weights>>,
    position: RwLock<Arc<Option<OpenPosition>>>,
}

impl SharedState {
    pub fn new(weights: Weights) -> Self {
        Self {
            state: RwLock::new(Arc::new(EngineState::default())),
            weights: RwLock::new(Arc::new(weights)),
            position: RwLock::new(Arc::new(None)),
        }
    }

    /// Last completed cycle
    pub fn snapshot(&self) -> Arc<EngineState> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn weights(&self) -> Arc<Weights> {
        self.weights
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn position(&self) -> Arc<Option<OpenPosition>> {
        self.position
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn publish_state(&self, state: EngineState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(state);
    }

    pub(crate) fn publish_weights(&self, weights: Weights) {
        *self.weights.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(weights);
    }

    pub(crate) fn publish_position(&self, position: Option<OpenPosition>) {
        *self.position.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(position);
    }
}
