use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use watchdog_core::engine::Outcome;
use watchdog_core::event::HealthEvent;

use crate::error::AppError;
use crate::state::AppState;

/// POST /webhook (and POST /) — one health notification from the deployment
/// controller.
///
/// The body is validated here; an event with a missing or mistyped field is
/// answered with 400 and never reaches the engine.
pub async fn receive_event(
    State(app): State<AppState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let event = HealthEvent::from_slice(&body)?;
    tracing::debug!(app = %event.app, status = %event.status, revision = %event.revision, "received event");

    let outcome = app.engine.handle(&event).await?;
    Ok(Json(render(&outcome)?))
}

fn render(outcome: &Outcome) -> Result<serde_json::Value, AppError> {
    let mut json = serde_json::to_value(outcome)?;
    if let Some(obj) = json.as_object_mut() {
        obj.insert("message".into(), outcome.message().into());
    }
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchdog_core::dispatch::RollbackIntent;

    #[test]
    fn render_adds_message() {
        let v = render(&Outcome::CheckpointSaved {
            revision: "abc123".into(),
        })
        .unwrap();
        assert_eq!(v["outcome"], "checkpoint_saved");
        assert_eq!(v["message"], "Commit ID saved");
        assert_eq!(v["revision"], "abc123");
    }

    #[test]
    fn render_flattens_intent() {
        let v = render(&Outcome::RollbackTriggered(RollbackIntent {
            app: "guestbook".into(),
            failed_revision: "bad999".into(),
            healthy_revision: "good111".into(),
        }))
        .unwrap();
        assert_eq!(v["outcome"], "rollback_triggered");
        assert_eq!(v["failed_revision"], "bad999");
        assert_eq!(v["healthy_revision"], "good111");
    }
}
