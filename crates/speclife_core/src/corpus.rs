//! Corpus scanning and path resolution.
//!
//! A document is *state-located* when its parent directory is one of the
//! registry's state directories directly under the corpus root.

use crate::config::CorpusConfig;
use crate::envelope::{infer_title, Envelope};
use crate::error::{LifecycleError, Result};
use crate::index::{IndexRow, SectionEntry};
use crate::numbering::{format_number, number_prefix};
use crate::registry::State;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Document extension picked up by scans.
const DOCUMENT_EXTENSION: &str = "md";

/// A document as the index sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedDocument {
    pub path: PathBuf,
    /// Path relative to the index directory, `/`-separated
    pub link: String,
    pub number: u32,
    pub label: String,
    pub title: String,
    /// Display name of the state the document is filed under
    pub state: String,
    pub updated: String,
}

impl TrackedDocument {
    pub fn index_row(&self) -> IndexRow {
        IndexRow::new(
            self.number,
            self.label.clone(),
            self.title.clone(),
            self.state.clone(),
            self.updated.clone(),
        )
    }

    pub fn section_entry(&self) -> SectionEntry {
        SectionEntry::new(
            self.number,
            self.label.clone(),
            self.title.clone(),
            self.link.clone(),
        )
    }
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Absolute, lexically normalized form of `path`.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    let abs = std::path::absolute(path).map_err(|e| LifecycleError::io(path, e))?;
    Ok(normalize_lexically(&abs))
}

/// `/`-separated path from directory `from` to `to`.
fn relative_link(from: &Path, to: &Path) -> String {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().to_string()),
    );
    parts.join("/")
}

/// View of the corpus on disk.
pub struct Corpus<'a> {
    config: &'a CorpusConfig,
}

impl<'a> Corpus<'a> {
    pub fn new(config: &'a CorpusConfig) -> Self {
        Self { config }
    }

    /// State whose directory directly contains `path`.
    pub fn locate(&self, path: &Path) -> Option<&'a State> {
        let parent = path.parent()?;
        if parent.parent()? != self.config.corpus_root {
            return None;
        }
        let dir_name = parent.file_name()?.to_str()?;
        self.config.registry.for_directory(dir_name)
    }

    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.config.corpus_root)
    }

    /// Link from the index to `path`.
    pub fn link_for(&self, path: &Path) -> Result<String> {
        if !self.contains(path) {
            return Err(LifecycleError::OutsideCorpus {
                path: path.to_path_buf(),
                root: self.config.corpus_root.clone(),
            });
        }
        Ok(relative_link(self.config.index_dir(), path))
    }

    /// Every document in every state directory, in registry order and
    /// sorted by file name within a directory.
    pub fn document_paths(&self) -> Result<Vec<(PathBuf, &'a State)>> {
        let mut found = Vec::new();
        for state in self.config.registry.states() {
            let dir = self.config.state_dir(state);
            if !dir.is_dir() {
                continue;
            }

            let mut paths = Vec::new();
            for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
                let entry = entry.map_err(|e| {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
                    LifecycleError::io(path, std::io::Error::other(e.to_string()))
                })?;
                let is_document = entry.file_type().is_file()
                    && entry.path().extension().and_then(|e| e.to_str()) == Some(DOCUMENT_EXTENSION);
                if is_document && entry.path() != self.config.index_path {
                    paths.push(entry.into_path());
                }
            }
            paths.sort();
            found.extend(paths.into_iter().map(|p| (p, state)));
        }
        Ok(found)
    }

    /// Build the index view of a document filed under `state`.
    ///
    /// The number comes from the envelope, then from the file name prefix.
    /// A document with neither cannot be indexed.
    pub fn track(&self, path: &Path, state: &State, content: &str) -> Result<TrackedDocument> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let envelope = Envelope::parse(content);

        let prefix = number_prefix(&file_name, self.config.number_width);
        let number = match &envelope {
            Ok(env) => env.number().or_else(|e| prefix.ok_or(e)),
            Err(e) => prefix.ok_or_else(|| e.clone()),
        }
        .map_err(|e| LifecycleError::malformed(path, e))?;

        let (title, updated) = match &envelope {
            Ok(env) => (
                env.title()
                    .map(str::to_string)
                    .unwrap_or_else(|| infer_title(&file_name, env.body())),
                env.updated().unwrap_or_default().to_string(),
            ),
            Err(_) => (infer_title(&file_name, content), String::new()),
        };

        Ok(TrackedDocument {
            path: path.to_path_buf(),
            link: self.link_for(path)?,
            number,
            label: format_number(number, self.config.number_width),
            title,
            state: state.name.clone(),
            updated,
        })
    }

    /// Highest number among the documents on disk, by file name prefix.
    pub fn max_number(&self) -> Result<Option<u32>> {
        Ok(self
            .document_paths()?
            .iter()
            .filter_map(|(p, _)| p.file_name()?.to_str().map(str::to_string))
            .filter_map(|name| number_prefix(&name, self.config.number_width))
            .max())
    }
}
