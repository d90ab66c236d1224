//! Durable storage for the last revision confirmed healthy.
//!
//! The store holds a single value. [`FileCheckpointStore`] keeps it as a
//! `KEY=VALUE` line in a plain-text file so an operator can read or fix it
//! with any editor; [`MemoryCheckpointStore`] is the in-process stand-in.

use crate::error::{Result, WatchdogError};
use crate::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_CHECKPOINT_FILE: &str = ".env";
pub const DEFAULT_CHECKPOINT_KEY: &str = "LAST_HEALTHY_COMMIT";

pub trait CheckpointStore: Send + Sync {
    /// Replace the checkpoint with `revision`. Durable once this returns `Ok`.
    fn save(&self, revision: &str) -> Result<()>;

    /// The current checkpoint, or `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<String>>;
}

/// Revisions are stored byte for byte; only values that cannot round-trip
/// through a single `KEY=VALUE` line, or that are blank, are refused.
fn check_revision(revision: &str) -> Result<()> {
    if revision.trim().is_empty() || revision.contains(['\n', '\r', '\0']) {
        return Err(WatchdogError::InvalidRevision(revision.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// FileCheckpointStore
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FileCheckpointStore {
    path: PathBuf,
    key: String,
    write_lock: Mutex<()>,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value of `line` if it assigns our key, e.g. `LAST_HEALTHY_COMMIT=abc`.
    /// Whitespace around the key is tolerated; the value is returned as is.
    fn value_of<'a>(&self, line: &'a str) -> Option<&'a str> {
        let (k, v) = line.split_once('=')?;
        (k.trim() == self.key).then_some(v)
    }

    /// Rebuild the file contents with exactly one assignment for our key.
    /// Other lines are kept in place; the first assignment is rewritten and
    /// any later duplicates are dropped.
    fn render(&self, existing: &str, revision: &str) -> String {
        let assignment = format!("{}={}", self.key, revision);
        let mut lines: Vec<&str> = Vec::new();
        let mut replaced = false;
        for line in existing.lines() {
            if self.value_of(line).is_some() {
                if !replaced {
                    lines.push(&assignment);
                    replaced = true;
                }
                continue;
            }
            lines.push(line);
        }
        if !replaced {
            lines.push(&assignment);
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn save(&self, revision: &str) -> Result<()> {
        check_revision(revision)?;
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let existing = io::read_optional(&self.path)
            .map_err(|e| WatchdogError::store(format!("read {}", self.path.display()), e))?
            .unwrap_or_default();
        let contents = self.render(&existing, revision);
        io::atomic_write(&self.path, contents.as_bytes())
            .map_err(|e| WatchdogError::store(format!("write {}", self.path.display()), e))?;

        tracing::debug!(path = %self.path.display(), key = %self.key, "checkpoint persisted");
        Ok(())
    }

    fn load(&self) -> Result<Option<String>> {
        let Some(contents) = io::read_optional(&self.path)
            .map_err(|e| WatchdogError::store(format!("read {}", self.path.display()), e))?
        else {
            return Ok(None);
        };
        Ok(contents
            .lines()
            .find_map(|line| self.value_of(line))
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string))
    }
}

// ---------------------------------------------------------------------------
// MemoryCheckpointStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    slot: Mutex<Option<String>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_revision(revision: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(revision.into())),
        }
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn save(&self, revision: &str) -> Result<()> {
        check_revision(revision)?;
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        *slot = Some(revision.to_string());
        Ok(())
    }

    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }
}
