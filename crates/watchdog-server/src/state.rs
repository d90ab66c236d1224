use watchdog_core::engine::DecisionEngine;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: DecisionEngine,
}

impl AppState {
    pub fn new(engine: DecisionEngine) -> Self {
        Self { engine }
    }
}
