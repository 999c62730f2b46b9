//! History-preserving document relocation.

use crate::error::{LifecycleError, Result};
use crate::history::HistoryProvider;
use std::path::Path;
use tracing::info;

/// Moves documents between directories through a [`HistoryProvider`].
///
/// There is no copy-then-delete fallback: if the provider cannot move the
/// file the operation fails and nothing is touched.
pub struct DocumentMover<'a, H: HistoryProvider + ?Sized> {
    provider: &'a H,
}

impl<'a, H: HistoryProvider + ?Sized> DocumentMover<'a, H> {
    pub fn new(provider: &'a H) -> Self {
        Self { provider }
    }

    /// Move `source` to `dest`, creating the destination directory first.
    pub fn relocate(&self, source: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LifecycleError::io(parent, e))?;
        }

        self.provider
            .move_path(source, dest)
            .map_err(|e| LifecycleError::MoveFailure {
                from: source.to_path_buf(),
                to: dest.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!(from = %source.display(), to = %dest.display(), "moved document");
        Ok(())
    }
}
