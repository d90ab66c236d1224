use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchdogError {
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("invalid revision {0:?}: must be non-blank, a single line, and free of NUL bytes")]
    InvalidRevision(String),

    #[error("checkpoint store error ({context}): {source}")]
    Store {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no healthy revision recorded; cannot roll back '{failed_revision}'")]
    NoBaseline { failed_revision: String },

    #[error("rollback dispatch rejected with HTTP {status}: {body}")]
    DispatchRejected { status: u16, body: String },

    #[error("rollback dispatch failed: {0}")]
    DispatchUnreachable(String),

    #[error("config not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used by the HTTP boundary and the CLI to decide how
/// a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Store,
    NoBaseline,
    Dispatch,
    Config,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Store => "store",
            ErrorKind::NoBaseline => "no_baseline",
            ErrorKind::Dispatch => "dispatch",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }
}

impl WatchdogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WatchdogError::InvalidEvent(_) | WatchdogError::InvalidRevision(_) => {
                ErrorKind::Validation
            }
            WatchdogError::Store { .. } => ErrorKind::Store,
            WatchdogError::NoBaseline { .. } => ErrorKind::NoBaseline,
            WatchdogError::DispatchRejected { .. } | WatchdogError::DispatchUnreachable(_) => {
                ErrorKind::Dispatch
            }
            WatchdogError::ConfigNotFound(_)
            | WatchdogError::InvalidConfig(_)
            | WatchdogError::Yaml(_) => ErrorKind::Config,
            WatchdogError::Io(_) | WatchdogError::Json(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn store(context: impl Into<String>, source: std::io::Error) -> Self {
        WatchdogError::Store {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchdogError>;
