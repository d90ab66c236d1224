//! Rollback decision engine.
//!
//! Maps one [`HealthEvent`] to at most one side effect: a checkpoint write on
//! `Healthy`, a rollback dispatch on `Degraded`. The engine keeps no state of
//! its own between events; everything durable lives in the checkpoint store.

use crate::checkpoint::CheckpointStore;
use crate::dispatch::{Dispatcher, RollbackIntent};
use crate::error::{Result, WatchdogError};
use crate::event::{HealthEvent, HealthStatus};
use serde::Serialize;
use std::sync::Arc;

/// What the engine did with an event that did not fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    CheckpointSaved { revision: String },
    RollbackTriggered(RollbackIntent),
    Ignored { status: String },
    SkippedApp { app: String },
}

impl Outcome {
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::CheckpointSaved { .. } => "Commit ID saved",
            Outcome::RollbackTriggered(_) => "Rollback triggered",
            Outcome::Ignored { .. } => "Webhook received",
            Outcome::SkippedApp { .. } => "Webhook received for unwatched app",
        }
    }
}

#[derive(Clone)]
pub struct DecisionEngine {
    store: Arc<dyn CheckpointStore>,
    dispatcher: Arc<dyn Dispatcher>,
    watched_app: Option<String>,
}

impl DecisionEngine {
    pub fn new(store: Arc<dyn CheckpointStore>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            store,
            dispatcher,
            watched_app: None,
        }
    }

    /// Restrict the engine to events for one application.
    pub fn watching(mut self, app: Option<String>) -> Self {
        self.watched_app = app;
        self
    }

    pub async fn handle(&self, event: &HealthEvent) -> Result<Outcome> {
        if let Some(watched) = &self.watched_app {
            if *watched != event.app {
                tracing::debug!(app = %event.app, watched = %watched, "event for unwatched app");
                return Ok(Outcome::SkippedApp {
                    app: event.app.clone(),
                });
            }
        }

        match &event.status {
            HealthStatus::Healthy => {
                self.save_checkpoint(event.revision.clone()).await?;
                tracing::info!(app = %event.app, revision = %event.revision, "saved healthy revision");
                Ok(Outcome::CheckpointSaved {
                    revision: event.revision.clone(),
                })
            }
            HealthStatus::Degraded => {
                let Some(healthy) = self.load_checkpoint().await? else {
                    tracing::warn!(
                        app = %event.app,
                        revision = %event.revision,
                        "degraded with no healthy revision to roll back to"
                    );
                    return Err(WatchdogError::NoBaseline {
                        failed_revision: event.revision.clone(),
                    });
                };

                let intent = RollbackIntent {
                    app: event.app.clone(),
                    failed_revision: event.revision.clone(),
                    healthy_revision: healthy,
                };
                tracing::info!(
                    app = %intent.app,
                    failed = %intent.failed_revision,
                    healthy = %intent.healthy_revision,
                    "requesting rollback"
                );
                if let Err(e) = self.dispatcher.dispatch(&intent).await {
                    tracing::error!(app = %intent.app, error = %e, "rollback dispatch failed");
                    return Err(e);
                }
                Ok(Outcome::RollbackTriggered(intent))
            }
            HealthStatus::Other(status) => {
                tracing::debug!(app = %event.app, status = %status, "status ignored");
                Ok(Outcome::Ignored {
                    status: status.clone(),
                })
            }
        }
    }

    pub async fn load_checkpoint(&self) -> Result<Option<String>> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.load())
            .await
            .map_err(join_error)?
    }

    async fn save_checkpoint(&self, revision: String) -> Result<()> {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || store.save(&revision))
            .await
            .map_err(join_error)?;
        if let Err(e) = &result {
            tracing::error!(error = %e, "failed to save healthy revision");
        }
        result
    }
}

fn join_error(e: tokio::task::JoinError) -> WatchdogError {
    WatchdogError::store("checkpoint task", std::io::Error::other(e.to_string()))
}
