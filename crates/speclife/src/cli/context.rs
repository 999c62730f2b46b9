//! Corpus context shared by every command.
//!
//! Configuration is looked up once per invocation: `--config` (or
//! `SPECLIFE_CONFIG`), then `./speclife.toml`, then built-in defaults.

use super::error::lifecycle;
use speclife_core::config::CONFIG_FILE_NAME;
use speclife_core::corpus::absolute;
use speclife_core::{CorpusConfig, GitHistory, LifecycleController, LifecycleError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolved configuration plus the file it came from.
pub struct CorpusContext {
    pub config: CorpusConfig,
    pub config_file: Option<PathBuf>,
}

impl CorpusContext {
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| lifecycle(LifecycleError::io(".", e)))?;

        let config_file = match explicit {
            Some(path) => Some(absolute(path).map_err(lifecycle)?),
            None => Some(cwd.join(CONFIG_FILE_NAME)).filter(|p| p.is_file()),
        };

        let mut config = CorpusConfig::discover(config_file.as_deref(), &cwd)
            .map_err(|e| lifecycle(e.into()))?;
        config.repo_root = absolute(&config.repo_root).map_err(lifecycle)?;
        debug!(
            corpus = %config.corpus_root.display(),
            config_file = ?config_file,
            "resolved configuration"
        );

        Ok(Self {
            config,
            config_file,
        })
    }

    /// Controller backed by git at the repository root.
    pub fn controller(self) -> LifecycleController<GitHistory> {
        let history = GitHistory::new(&self.config.repo_root);
        LifecycleController::new(self.config, history)
    }
}

/// Shorthand for `CorpusContext::load(explicit)?.controller()`.
pub fn controller(explicit: Option<&Path>) -> anyhow::Result<LifecycleController<GitHistory>> {
    Ok(CorpusContext::load(explicit)?.controller())
}
