use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use watchdog_core::checkpoint::{CheckpointStore, FileCheckpointStore};
use watchdog_core::config::Config;

/// Loaded configuration plus the directory relative paths resolve against.
pub struct Settings {
    pub config_path: PathBuf,
    pub config: Config,
    pub base: PathBuf,
}

impl Settings {
    /// Load `config_path`, falling back to defaults when it does not exist.
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        let config = Config::load_or_default(config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?;
        Ok(Self {
            config_path: config_path.to_path_buf(),
            base: base_dir(config_path),
            config,
        })
    }

    pub fn checkpoint_store(&self) -> Arc<dyn CheckpointStore> {
        Arc::new(FileCheckpointStore::new(
            self.config.checkpoint_path(&self.base),
            self.config.checkpoint.key.clone(),
        ))
    }
}

/// Directory containing the config file; the current directory when the
/// path has no parent component.
fn base_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
