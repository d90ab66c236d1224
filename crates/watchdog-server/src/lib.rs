pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use watchdog_core::engine::DecisionEngine;

/// Build the axum Router with all routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(engine: DecisionEngine) -> Router {
    let app_state = state::AppState::new(engine);

    Router::new()
        // Deployment controller notifications
        .route("/", post(routes::webhook::receive_event))
        .route("/webhook", post(routes::webhook::receive_event))
        // Operator inspection
        .route("/api/checkpoint", get(routes::checkpoint::get_checkpoint))
        .route("/healthz", get(routes::health::healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Bind `addr` and serve webhooks until the process is stopped.
pub async fn serve(engine: DecisionEngine, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_on(engine, listener).await
}

/// Serve on a pre-bound listener.
///
/// Lets the caller read the actual port before starting (useful when
/// `port = 0` and the OS picks a free port).
pub async fn serve_on(
    engine: DecisionEngine,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let local = listener.local_addr()?;
    let app = build_router(engine);

    tracing::info!("webhook server listening on http://{local}");

    axum::serve(listener, app).await?;
    Ok(())
}
