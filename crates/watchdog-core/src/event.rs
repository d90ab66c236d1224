use crate::error::{Result, WatchdogError};
use std::fmt;

// ---------------------------------------------------------------------------
// HealthStatus
// ---------------------------------------------------------------------------

/// Health status reported by the deployment controller.
///
/// Anything other than the two recognized values is carried through verbatim
/// so it can be logged and echoed back, but the engine treats it as a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Other(String),
}

impl HealthStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "Healthy" => HealthStatus::Healthy,
            "Degraded" => HealthStatus::Degraded,
            other => HealthStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// HealthEvent
// ---------------------------------------------------------------------------

/// One health notification for one application.
///
/// Construct through [`HealthEvent::from_json`] when the input is untrusted;
/// it is the only place that enforces the required-field contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthEvent {
    pub app: String,
    pub status: HealthStatus,
    pub revision: String,
}

impl HealthEvent {
    pub fn new(app: impl Into<String>, status: HealthStatus, revision: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            status,
            revision: revision.into(),
        }
    }

    /// Validate a decoded JSON payload. The payload must be an object carrying
    /// `app`, `status` and `revision` as strings; `app` and `revision` must be
    /// non-blank. Values are kept exactly as sent. Unknown extra fields are
    /// ignored.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| WatchdogError::InvalidEvent("payload must be a JSON object".into()))?;

        let app = str_field(obj, "app")?;
        let status = str_field(obj, "status")?;
        let revision = str_field(obj, "revision")?;

        if app.trim().is_empty() {
            return Err(WatchdogError::InvalidEvent("field 'app' is empty".into()));
        }
        if revision.trim().is_empty() {
            return Err(WatchdogError::InvalidEvent(
                "field 'revision' is empty".into(),
            ));
        }

        Ok(Self::new(app, HealthStatus::parse(status), revision))
    }

    /// Decode and validate raw request bytes.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| WatchdogError::InvalidEvent(format!("malformed JSON: {e}")))?;
        Self::from_json(&value)
    }
}

fn str_field<'a>(obj: &'a serde_json::Map<String, serde_json::Value>, name: &str) -> Result<&'a str> {
    match obj.get(name) {
        None | Some(serde_json::Value::Null) => Err(WatchdogError::InvalidEvent(format!(
            "missing required field '{name}'"
        ))),
        Some(serde_json::Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(WatchdogError::InvalidEvent(format!(
            "field '{name}' must be a string"
        ))),
    }
}
