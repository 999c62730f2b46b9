//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use speclife_core::{ConfigError, LifecycleError};
use std::fmt;
use std::path::Path;

/// Usage summary printed for argument shapes no command accepts.
pub const USAGE: &str = "\
speclife                         list documents by state
speclife states                  list supported states
speclife <path> <state>          transition a document
speclife <path>                  move a document to the directory its envelope names
speclife index <path>            add a document to the index
speclife add-headers <path>      synthesize or repair a document's envelope
speclife add <path>              number, file, register and index a new document
speclife update-index [--check]  resynchronize the index";

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Arguments matched no command shape
    pub fn usage(args: &[String]) -> Self {
        Self::new(format!("Unrecognized arguments: {}", args.join(" ")))
            .with_context(format!("Usage:\n{}", USAGE))
            .with_suggestion("TRY: speclife --help")
    }

    /// Index needs changes (update-index --check)
    pub fn index_out_of_date(index: &Path) -> Self {
        Self::new(format!("Index is out of date: {}", index.display()))
            .with_context("Running update-index would change the index or document envelopes")
            .with_suggestion("TRY: speclife update-index")
    }

    fn file_not_found(path: &Path) -> Self {
        Self::new(format!("File not found: {}", path.display()))
            .with_context("The specified document does not exist")
            .with_suggestions([
                format!("TRY: Check if the file exists: ls -la {}", path.display()),
                format!(
                    "TRY: Look for similar files: ls {}",
                    path.parent()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| ".".to_string())
                ),
            ])
    }

    fn config(err: &ConfigError) -> Self {
        Self::new(err.to_string())
            .with_context("The corpus configuration could not be loaded")
            .with_suggestions([
                "TRY: Check speclife.toml (or the file given by --config / SPECLIFE_CONFIG)",
                "TRY: Show the defaults: speclife config",
            ])
    }
}

impl From<&LifecycleError> for HelpfulError {
    fn from(err: &LifecycleError) -> Self {
        let base = Self::new(err.to_string());
        match err {
            LifecycleError::FileNotFound(path) => Self::file_not_found(path),
            LifecycleError::UnsupportedState { .. } => base
                .with_context("States are fixed by configuration")
                .with_suggestion("TRY: List states and directories: speclife states"),
            LifecycleError::AlreadyInState { .. } => base
                .with_context("A transition needs a target different from the current state")
                .with_suggestion("TRY: List states: speclife states"),
            LifecycleError::AlreadyInCorrectDirectory { path, .. } => base
                .with_context("The envelope's state already matches the document's directory")
                .with_suggestion(format!(
                    "TRY: Transition instead: speclife {} <state>",
                    path.display()
                )),
            LifecycleError::MalformedEnvelope { path, .. } => base
                .with_context("Documents start with a '---' block of 'key: value' lines")
                .with_suggestion(format!(
                    "TRY: Generate one: speclife add-headers {}",
                    path.display()
                )),
            LifecycleError::MissingStateField(path) => base
                .with_context("Without a state the target directory cannot be determined")
                .with_suggestions([
                    "TRY: Add a 'state: <State>' line to the envelope".to_string(),
                    format!("TRY: Or transition explicitly: speclife {} <state>", path.display()),
                ]),
            LifecycleError::MoveFailure { .. } => base
                .with_context("The history-preserving move failed; the document was not changed")
                .with_suggestions([
                    "TRY: Check for conflicts: git status",
                    "TRY: Remove or rename the file already at the destination",
                ]),
            LifecycleError::NumberInUse { path, .. } => base
                .with_context("Document numbers are unique and never reused")
                .with_suggestion(format!(
                    "TRY: Drop the number prefix and let add assign one: speclife add {}",
                    path.display()
                )),
            LifecycleError::OutsideCorpus { path, .. } => base
                .with_context("Only documents under the corpus root can be indexed")
                .with_suggestion(format!("TRY: Onboard it: speclife add {}", path.display())),
            LifecycleError::History(_) => base
                .with_context("A git command failed")
                .with_suggestions([
                    "TRY: Check that git is installed: git --version",
                    "TRY: Repair the index afterwards: speclife update-index",
                ]),
            LifecycleError::Config(inner) => Self::config(inner),
            LifecycleError::Io { path, .. } => base
                .with_context(format!("Filesystem operation failed on {}", path.display()))
                .with_suggestions([
                    format!("TRY: Check permissions: ls -la {}", path.display()),
                    "TRY: Repair the index afterwards: speclife update-index".to_string(),
                ]),
        }
    }
}

/// Convert a core error for display.
pub fn lifecycle(err: LifecycleError) -> anyhow::Error {
    tracing::debug!(user_error = err.is_user_error(), "{err}");
    HelpfulError::from(&err).into()
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}
