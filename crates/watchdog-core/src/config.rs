use crate::checkpoint::{DEFAULT_CHECKPOINT_FILE, DEFAULT_CHECKPOINT_KEY};
use crate::error::{Result, WatchdogError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "watchdog.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// Opaque token used to authenticate the rollback dispatch.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

// ---------------------------------------------------------------------------
// ListenConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ListenConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ---------------------------------------------------------------------------
// CheckpointConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    #[serde(default = "default_checkpoint_path")]
    pub path: PathBuf,
    #[serde(default = "default_checkpoint_key")]
    pub key: String,
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from(DEFAULT_CHECKPOINT_FILE)
}

fn default_checkpoint_key() -> String {
    DEFAULT_CHECKPOINT_KEY.to_string()
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            path: default_checkpoint_path(),
            key: default_checkpoint_key(),
        }
    }
}

// ---------------------------------------------------------------------------
// WatchConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Only act on events for this application. `None` accepts every app,
    /// all sharing the one checkpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
}

// ---------------------------------------------------------------------------
// DispatchConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// `owner/name` of the repository whose workflow performs the revert.
    #[serde(default)]
    pub repository: String,
    #[serde(default = "default_event_type")]
    pub event_type: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Credential>,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_event_type() -> String {
    "argo-degraded".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            repository: String::new(),
            event_type: default_event_type(),
            timeout_secs: default_timeout_secs(),
            dry_run: false,
            token: None,
        }
    }
}

impl DispatchConfig {
    pub fn dispatch_url(&self) -> String {
        format!(
            "{}/repos/{}/dispatches",
            self.api_url.trim_end_matches('/'),
            self.repository.trim_matches('/')
        )
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub checkpoint: CheckpointConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(WatchdogError::ConfigNotFound(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Like [`Config::load`] but falls back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(WatchdogError::ConfigNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())?;
        Ok(())
    }

    /// Copy with the credential masked, for display.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        if cfg.dispatch.token.is_some() {
            cfg.dispatch.token = Some(Credential::new("***"));
        }
        cfg
    }

    /// Resolve a relative checkpoint path against `base` (usually the
    /// directory holding the config file).
    pub fn checkpoint_path(&self, base: &Path) -> PathBuf {
        if self.checkpoint.path.is_absolute() {
            self.checkpoint.path.clone()
        } else {
            base.join(&self.checkpoint.path)
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level: WarnLevel, message: String| {
            warnings.push(ConfigWarning { level, message });
        };

        let key = self.checkpoint.key.trim();
        if key.is_empty() {
            push(WarnLevel::Error, "checkpoint.key is empty".to_string());
        } else if key.contains('=') || key.contains(char::is_whitespace) {
            push(
                WarnLevel::Error,
                format!("checkpoint.key '{key}' must not contain '=' or whitespace"),
            );
        }

        // A dry run never contacts the repository, so a missing one only warns.
        let repo_level = if self.dispatch.dry_run {
            WarnLevel::Warning
        } else {
            WarnLevel::Error
        };
        let repo = self.dispatch.repository.trim();
        if repo.is_empty() {
            push(
                repo_level.clone(),
                "dispatch.repository is empty; rollbacks cannot be triggered".to_string(),
            );
        } else if repo.trim_matches('/').split('/').count() != 2 {
            push(
                repo_level,
                format!("dispatch.repository '{repo}' must be of the form owner/name"),
            );
        }

        if self.dispatch.timeout_secs == 0 {
            push(
                WarnLevel::Error,
                "dispatch.timeout_secs must be greater than 0".to_string(),
            );
        } else if self.dispatch.timeout_secs > 120 {
            push(
                WarnLevel::Warning,
                format!(
                    "dispatch.timeout_secs={} is unusually long",
                    self.dispatch.timeout_secs
                ),
            );
        }

        if !self.dispatch.api_url.starts_with("http://")
            && !self.dispatch.api_url.starts_with("https://")
        {
            push(
                WarnLevel::Error,
                format!(
                    "dispatch.api_url '{}' is not an http(s) URL",
                    self.dispatch.api_url
                ),
            );
        }

        if self.dispatch.event_type.trim().is_empty() {
            push(WarnLevel::Error, "dispatch.event_type is empty".to_string());
        }

        let has_token = self
            .dispatch
            .token
            .as_ref()
            .is_some_and(|t| !t.is_empty());
        if !self.dispatch.dry_run && !has_token {
            push(
                WarnLevel::Warning,
                "no dispatch token configured; it must be supplied at startup".to_string(),
            );
        }

        if matches!(&self.watch.app, Some(app) if app.trim().is_empty()) {
            push(
                WarnLevel::Warning,
                "watch.app is set but empty; no event will match".to_string(),
            );
        }

        warnings
    }

    pub fn has_errors(warnings: &[ConfigWarning]) -> bool {
        warnings.iter().any(|w| w.level == WarnLevel::Error)
    }
}
