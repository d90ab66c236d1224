//! Outbound rollback trigger.
//!
//! The engine hands a [`RollbackIntent`] to a [`Dispatcher`]. The production
//! implementation fires a GitHub `repository_dispatch` event; the workflow on
//! the other end performs the actual revert.

use crate::config::{Credential, DispatchConfig};
use crate::error::{Result, WatchdogError};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Revert from `failed_revision` back to `healthy_revision`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackIntent {
    pub app: String,
    pub failed_revision: String,
    pub healthy_revision: String,
}

#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, intent: &RollbackIntent) -> Result<()>;
}

// ---------------------------------------------------------------------------
// GitHubDispatcher
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct DispatchBody<'a> {
    event_type: &'a str,
    client_payload: ClientPayload<'a>,
}

#[derive(Serialize)]
struct ClientPayload<'a> {
    failed_revision: &'a str,
    healthy_revision: &'a str,
}

pub struct GitHubDispatcher {
    client: reqwest::Client,
    url: String,
    event_type: String,
    token: Credential,
}

impl GitHubDispatcher {
    pub fn new(config: &DispatchConfig, token: Credential) -> Result<Self> {
        if config.repository.trim().is_empty() {
            return Err(WatchdogError::InvalidConfig(
                "dispatch.repository is empty".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("rollback-watchdog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WatchdogError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            client,
            url: config.dispatch_url(),
            event_type: config.event_type.clone(),
            token,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Dispatcher for GitHubDispatcher {
    async fn dispatch(&self, intent: &RollbackIntent) -> Result<()> {
        let body = DispatchBody {
            event_type: &self.event_type,
            client_payload: ClientPayload {
                failed_revision: &intent.failed_revision,
                healthy_revision: &intent.healthy_revision,
            },
        };

        let response = self
            .client
            .post(&self.url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("token {}", self.token.expose()),
            )
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&body)
            .send()
            .await
            .map_err(|e| WatchdogError::DispatchUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WatchdogError::DispatchRejected {
                status: status.as_u16(),
                body: text,
            });
        }

        tracing::info!(
            app = %intent.app,
            failed = %intent.failed_revision,
            healthy = %intent.healthy_revision,
            "rollback workflow triggered"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DryRunDispatcher
// ---------------------------------------------------------------------------

/// Logs the intent instead of sending it.
#[derive(Debug, Default)]
pub struct DryRunDispatcher;

#[async_trait]
impl Dispatcher for DryRunDispatcher {
    async fn dispatch(&self, intent: &RollbackIntent) -> Result<()> {
        tracing::info!(
            app = %intent.app,
            failed = %intent.failed_revision,
            healthy = %intent.healthy_revision,
            "dry run: rollback not sent"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------

pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every intent it receives. When built with `failing(status)` it
    /// records and then reports a rejection with that HTTP status.
    #[derive(Debug, Default)]
    pub struct RecordingDispatcher {
        sent: Mutex<Vec<RollbackIntent>>,
        fail_with: Option<u16>,
    }

    impl RecordingDispatcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing(status: u16) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_with: Some(status),
            }
        }

        pub fn sent(&self) -> Vec<RollbackIntent> {
            self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
        }
    }

    #[async_trait]
    impl Dispatcher for RecordingDispatcher {
        async fn dispatch(&self, intent: &RollbackIntent) -> Result<()> {
            self.sent
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .push(intent.clone());
            match self.fail_with {
                Some(status) => Err(WatchdogError::DispatchRejected {
                    status,
                    body: "simulated failure".into(),
                }),
                None => Ok(()),
            }
        }
    }
}
