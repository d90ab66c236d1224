use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/checkpoint — the revision currently remembered as healthy.
pub async fn get_checkpoint(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let revision = app.engine.load_checkpoint().await?;
    Ok(Json(serde_json::json!({ "revision": revision })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use watchdog_core::checkpoint::MemoryCheckpointStore;
    use watchdog_core::dispatch::DryRunDispatcher;
    use watchdog_core::engine::DecisionEngine;

    #[tokio::test]
    async fn reports_null_when_absent() {
        let engine = DecisionEngine::new(
            Arc::new(MemoryCheckpointStore::new()),
            Arc::new(DryRunDispatcher),
        );
        let Json(v) = get_checkpoint(State(AppState::new(engine))).await.unwrap();
        assert!(v["revision"].is_null());
    }

    #[tokio::test]
    async fn reports_saved_revision() {
        let engine = DecisionEngine::new(
            Arc::new(MemoryCheckpointStore::with_revision("good111")),
            Arc::new(DryRunDispatcher),
        );
        let Json(v) = get_checkpoint(State(AppState::new(engine))).await.unwrap();
        assert_eq!(v["revision"], "good111");
    }
}
