//! Closed set of lifecycle states.
//!
//! Each state binds a canonical display name ("Under Review") to the
//! directory that holds its documents ("under-review"). The registry is
//! built once from configuration and never mutated afterwards.

use crate::config::ConfigError;
use crate::error::LifecycleError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Canonical title-case display name, as written in envelopes and the index.
    pub name: String,
    /// Directory name under the corpus root.
    pub directory: String,
}

impl State {
    pub fn new(name: impl Into<String>, directory: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
        }
    }
}

const BUILTIN_STATES: [(&str, &str); 10] = [
    ("Draft", "draft"),
    ("Under Review", "under-review"),
    ("Accepted", "accepted"),
    ("Final", "final"),
    ("Active", "active"),
    ("Deferred", "deferred"),
    ("Rejected", "rejected"),
    ("Withdrawn", "withdrawn"),
    ("Superseded", "superseded"),
    ("Obsolete", "obsolete"),
];

/// Immutable state table shared by every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRegistry {
    states: Vec<State>,
}

impl StateRegistry {
    /// Build a registry, rejecting duplicate names or directories.
    pub fn new(states: Vec<State>) -> Result<Self, ConfigError> {
        if states.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one state must be configured".to_string(),
            ));
        }

        let mut keys = HashSet::new();
        let mut dirs = HashSet::new();
        for state in &states {
            if state.name.trim().is_empty() || state.directory.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "state entries need both a name and a directory (got name='{}', directory='{}')",
                    state.name, state.directory
                )));
            }
            if state.directory.contains(['/', '\\']) {
                return Err(ConfigError::Invalid(format!(
                    "state directory '{}' must be a single path component",
                    state.directory
                )));
            }
            if !keys.insert(Self::normalize(&state.name)) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate state name '{}'",
                    state.name
                )));
            }
            if !dirs.insert(Self::normalize(&state.directory)) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate state directory '{}'",
                    state.directory
                )));
            }
        }

        Ok(Self { states })
    }

    /// The ten built-in states.
    pub fn builtin() -> Self {
        Self {
            states: BUILTIN_STATES
                .iter()
                .map(|(name, dir)| State::new(*name, *dir))
                .collect(),
        }
    }

    /// Comparison key: lower-cased, hyphens and underscores read as spaces,
    /// whitespace collapsed.
    ///
    /// `"Under-Review"`, `"under review"` and `"UNDER REVIEW"` share a key.
    pub fn normalize(input: &str) -> String {
        input
            .to_lowercase()
            .replace(['-', '_'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// States in configuration order.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Find a state by display name or directory name.
    pub fn lookup(&self, input: &str) -> Option<&State> {
        let key = Self::normalize(input);
        if key.is_empty() {
            return None;
        }
        self.states.iter().find(|s| {
            Self::normalize(&s.name) == key || Self::normalize(&s.directory) == key
        })
    }

    /// Like [`lookup`](Self::lookup), failing with the list of valid states.
    pub fn resolve(&self, input: &str) -> Result<&State, LifecycleError> {
        self.lookup(input)
            .ok_or_else(|| LifecycleError::UnsupportedState {
                state: input.to_string(),
                valid: self.all_display_names(),
            })
    }

    pub fn resolve_directory(&self, input: &str) -> Result<&str, LifecycleError> {
        self.resolve(input).map(|s| s.directory.as_str())
    }

    /// Canonical title-case form of `input`.
    pub fn display_form(&self, input: &str) -> Result<&str, LifecycleError> {
        self.resolve(input).map(|s| s.name.as_str())
    }

    /// The state whose directory is exactly `dir_name`.
    pub fn for_directory(&self, dir_name: &str) -> Option<&State> {
        self.states.iter().find(|s| s.directory == dir_name)
    }

    /// Display names sorted alphabetically.
    pub fn all_display_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.states.iter().map(|s| s.name.clone()).collect();
        names.sort();
        names
    }

    /// True when both inputs normalize to the same key.
    pub fn same_state(a: &str, b: &str) -> bool {
        Self::normalize(a) == Self::normalize(b)
    }
}

impl Default for StateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
