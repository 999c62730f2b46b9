//! Corpus configuration.
//!
//! Loaded from `speclife.toml` when present; every key has a default so an
//! empty (or missing) file yields the built-in ten-state corpus under `specs/`.

use crate::registry::{State, StateRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "speclife.toml";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// On-disk shape of `speclife.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Directory holding the state directories and the index
    #[serde(default = "default_corpus_root")]
    pub corpus_root: PathBuf,

    /// Index file, relative to `corpus_root`
    #[serde(default = "default_index_file")]
    pub index_file: PathBuf,

    /// State given to newly added documents
    #[serde(default = "default_state")]
    pub default_state: String,

    /// Width of the zero-padded document number
    #[serde(default = "default_number_width")]
    pub number_width: usize,

    /// Replaces the built-in states when non-empty
    #[serde(default)]
    pub states: Vec<State>,
}

fn default_corpus_root() -> PathBuf {
    PathBuf::from("specs")
}

fn default_index_file() -> PathBuf {
    PathBuf::from("README.md")
}

fn default_state() -> String {
    "Draft".to_string()
}

fn default_number_width() -> usize {
    4
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            corpus_root: default_corpus_root(),
            index_file: default_index_file(),
            default_state: default_state(),
            number_width: default_number_width(),
            states: Vec::new(),
        }
    }
}

/// Resolved, validated configuration passed into every component.
#[derive(Debug, Clone)]
pub struct CorpusConfig {
    /// Repository root; relative paths and version-control commands run here
    pub repo_root: PathBuf,
    /// Absolute corpus root
    pub corpus_root: PathBuf,
    /// Absolute index path
    pub index_path: PathBuf,
    /// Canonical display name of the initial state
    pub default_state: String,
    pub number_width: usize,
    pub registry: StateRegistry,
}

impl CorpusConfig {
    /// Built-in defaults rooted at `repo_root`.
    pub fn with_root(repo_root: impl Into<PathBuf>) -> Self {
        let repo_root = repo_root.into();
        let file = ConfigFile::default();
        let corpus_root = repo_root.join(&file.corpus_root);
        Self {
            index_path: corpus_root.join(&file.index_file),
            corpus_root,
            repo_root,
            default_state: file.default_state,
            number_width: file.number_width,
            registry: StateRegistry::builtin(),
        }
    }

    /// Load `path` and resolve its relative paths against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let repo_root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_file(repo_root, file)
    }

    /// Resolve config: explicit path, then `./speclife.toml`, then defaults.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = cwd.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::with_root(cwd))
        }
    }

    /// Validate a parsed config file.
    pub fn from_file(repo_root: PathBuf, file: ConfigFile) -> Result<Self, ConfigError> {
        if !(1..=9).contains(&file.number_width) {
            return Err(ConfigError::Invalid(format!(
                "number_width must be between 1 and 9, got {}",
                file.number_width
            )));
        }

        let registry = if file.states.is_empty() {
            StateRegistry::builtin()
        } else {
            StateRegistry::new(file.states)?
        };

        let default_state = registry
            .lookup(&file.default_state)
            .map(|s| s.name.clone())
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "default_state '{}' is not one of: {}",
                    file.default_state,
                    registry.all_display_names().join(", ")
                ))
            })?;

        let corpus_root = repo_root.join(&file.corpus_root);
        let index_path = corpus_root.join(&file.index_file);

        Ok(Self {
            repo_root,
            corpus_root,
            index_path,
            default_state,
            number_width: file.number_width,
            registry,
        })
    }

    /// Directory of the index file; bullet links are relative to it.
    pub fn index_dir(&self) -> &Path {
        self.index_path.parent().unwrap_or(&self.corpus_root)
    }

    /// Absolute path of a state's directory.
    pub fn state_dir(&self, state: &State) -> PathBuf {
        self.corpus_root.join(&state.directory)
    }
}
