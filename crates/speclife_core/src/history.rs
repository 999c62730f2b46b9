//! Version-control boundary.
//!
//! The lifecycle logic needs exactly three things from version control:
//! a history-preserving move, the author/date range of a path, and
//! registering a new file. [`GitHistory`] shells out to `git`;
//! [`InMemoryHistory`] is a fake for tests.

use chrono::{Local, NaiveDate};
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;
use tracing::debug;

/// Author recorded when history has nothing to say.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Version-control errors. Subprocess diagnostics are carried verbatim.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("failed to execute git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {command} failed: {stderr}")]
    Failed { command: String, stderr: String },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Author and date range of a path's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathHistory {
    /// Author of the earliest commit
    pub first_author: String,
    /// Date of the earliest commit
    pub created: NaiveDate,
    /// Date of the latest commit
    pub updated: NaiveDate,
}

/// History provider seam between the lifecycle logic and version control.
pub trait HistoryProvider {
    /// Move `from` to `to`, preserving history where there is any.
    fn move_path(&self, from: &Path, to: &Path) -> Result<(), HistoryError>;

    /// History of `path`, or `None` for a path with no commits.
    fn history(&self, path: &Path) -> Result<Option<PathHistory>, HistoryError>;

    /// Start tracking `path`.
    fn register(&self, path: &Path) -> Result<(), HistoryError>;
}

/// `git` subprocess provider rooted at a repository directory.
#[derive(Debug, Clone)]
pub struct GitHistory {
    repo_root: PathBuf,
}

impl GitHistory {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    fn path_arg<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.repo_root).unwrap_or(path)
    }

    fn run(&self, command: &str, args: &[&OsStr]) -> Result<Output, HistoryError> {
        debug!(command, repo = %self.repo_root.display(), "running git");
        Command::new("git")
            .arg("-C")
            .arg(&self.repo_root)
            .arg(command)
            .args(args)
            .output()
            .map_err(|source| HistoryError::Spawn {
                command: command.to_string(),
                source,
            })
    }

    fn run_checked(&self, command: &str, args: &[&OsStr]) -> Result<Output, HistoryError> {
        let output = self.run(command, args)?;
        if !output.status.success() {
            return Err(HistoryError::Failed {
                command: command.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    /// True when `repo_root` is inside a git work tree. A missing `git`
    /// binary counts as "not a repository".
    pub fn in_repository(&self) -> bool {
        self.run("rev-parse", &[OsStr::new("--is-inside-work-tree")])
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn has_commits(&self) -> bool {
        self.run("rev-parse", &[OsStr::new("--verify"), OsStr::new("--quiet"), OsStr::new("HEAD")])
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// True when git tracks `path`. Outside a repository nothing is tracked.
    pub fn is_tracked(&self, path: &Path) -> Result<bool, HistoryError> {
        if !self.in_repository() {
            return Ok(false);
        }
        let output = self.run(
            "ls-files",
            &[OsStr::new("--error-unmatch"), OsStr::new("--"), self.path_arg(path).as_os_str()],
        )?;
        Ok(output.status.success())
    }
}

impl HistoryProvider for GitHistory {
    fn move_path(&self, from: &Path, to: &Path) -> Result<(), HistoryError> {
        if self.is_tracked(from)? {
            self.run_checked(
                "mv",
                &[
                    OsStr::new("--"),
                    self.path_arg(from).as_os_str(),
                    self.path_arg(to).as_os_str(),
                ],
            )?;
            return Ok(());
        }

        // Untracked: no history to carry, but never clobber an existing file.
        if to.exists() {
            return Err(HistoryError::Failed {
                command: "mv".to_string(),
                stderr: format!("destination exists: {}", to.display()),
            });
        }
        std::fs::rename(from, to).map_err(|source| HistoryError::Io {
            path: from.to_path_buf(),
            source,
        })
    }

    fn history(&self, path: &Path) -> Result<Option<PathHistory>, HistoryError> {
        if !self.in_repository() || !self.has_commits() {
            return Ok(None);
        }
        let output = self.run_checked(
            "log",
            &[
                OsStr::new("--follow"),
                OsStr::new("--format=%an%x09%as"),
                OsStr::new("--"),
                self.path_arg(path).as_os_str(),
            ],
        )?;
        Ok(parse_log(&String::from_utf8_lossy(&output.stdout)))
    }

    fn register(&self, path: &Path) -> Result<(), HistoryError> {
        if !self.in_repository() {
            debug!(path = %path.display(), "not a git work tree, skipping git add");
            return Ok(());
        }
        self.run_checked("add", &[OsStr::new("--"), self.path_arg(path).as_os_str()])?;
        Ok(())
    }
}

/// Parse `%an<TAB>%as` lines, newest first.
fn parse_log(stdout: &str) -> Option<PathHistory> {
    let entries: Vec<(&str, NaiveDate)> = stdout
        .lines()
        .filter_map(|line| {
            let (author, date) = line.split_once('\t')?;
            let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
            Some((author.trim(), date))
        })
        .collect();

    let (_, updated) = entries.first()?;
    let (first_author, created) = entries.last()?;
    Some(PathHistory {
        first_author: first_author.to_string(),
        created: *created,
        updated: *updated,
    })
}

/// In-memory provider: plain renames and scripted history, keyed by file name.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    histories: RefCell<HashMap<String, PathHistory>>,
    registered: RefCell<Vec<PathBuf>>,
    moves: RefCell<Vec<(PathBuf, PathBuf)>>,
    reject_moves: RefCell<Option<String>>,
}

fn file_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the history returned for files named like `path`.
    pub fn with_history(self, path: impl AsRef<Path>, history: PathHistory) -> Self {
        self.histories
            .borrow_mut()
            .insert(file_key(path.as_ref()), history);
        self
    }

    /// Make every subsequent move fail with `reason`.
    pub fn reject_moves(&self, reason: impl Into<String>) {
        *self.reject_moves.borrow_mut() = Some(reason.into());
    }

    pub fn registered(&self) -> Vec<PathBuf> {
        self.registered.borrow().clone()
    }

    pub fn moves(&self) -> Vec<(PathBuf, PathBuf)> {
        self.moves.borrow().clone()
    }
}

impl HistoryProvider for InMemoryHistory {
    fn move_path(&self, from: &Path, to: &Path) -> Result<(), HistoryError> {
        if let Some(reason) = self.reject_moves.borrow().as_ref() {
            return Err(HistoryError::Failed {
                command: "mv".to_string(),
                stderr: reason.clone(),
            });
        }
        if to.exists() {
            return Err(HistoryError::Failed {
                command: "mv".to_string(),
                stderr: format!("destination exists: {}", to.display()),
            });
        }
        std::fs::rename(from, to).map_err(|source| HistoryError::Io {
            path: from.to_path_buf(),
            source,
        })?;

        let mut histories = self.histories.borrow_mut();
        if let Some(history) = histories.remove(&file_key(from)) {
            histories.insert(file_key(to), history);
        }
        self.moves
            .borrow_mut()
            .push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }

    fn history(&self, path: &Path) -> Result<Option<PathHistory>, HistoryError> {
        Ok(self.histories.borrow().get(&file_key(path)).cloned())
    }

    fn register(&self, path: &Path) -> Result<(), HistoryError> {
        self.registered.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

/// Authorship and dates for a path, with "Unknown"/today fallbacks.
pub struct HistoryInference<'a, H: HistoryProvider + ?Sized> {
    provider: &'a H,
    today: NaiveDate,
}

impl<'a, H: HistoryProvider + ?Sized> HistoryInference<'a, H> {
    pub fn new(provider: &'a H, today: NaiveDate) -> Self {
        Self { provider, today }
    }

    /// Inference anchored at the local calendar date.
    pub fn local(provider: &'a H) -> Self {
        Self::new(provider, Local::now().date_naive())
    }

    /// Earliest contributor.
    pub fn author_of(&self, path: &Path) -> Result<String, HistoryError> {
        Ok(self
            .provider
            .history(path)?
            .map(|h| h.first_author)
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()))
    }

    /// Earliest commit date.
    pub fn created_date_of(&self, path: &Path) -> Result<NaiveDate, HistoryError> {
        Ok(self
            .provider
            .history(path)?
            .map(|h| h.created)
            .unwrap_or(self.today))
    }

    /// Latest commit date.
    pub fn updated_date_of(&self, path: &Path) -> Result<NaiveDate, HistoryError> {
        Ok(self
            .provider
            .history(path)?
            .map(|h| h.updated)
            .unwrap_or(self.today))
    }

    /// All three facts from a single history query.
    pub fn infer(&self, path: &Path) -> Result<PathHistory, HistoryError> {
        Ok(self
            .provider
            .history(path)?
            .map(|mut h| {
                if h.first_author.is_empty() {
                    h.first_author = UNKNOWN_AUTHOR.to_string();
                }
                h
            })
            .unwrap_or_else(|| PathHistory {
                first_author: UNKNOWN_AUTHOR.to_string(),
                created: self.today,
                updated: self.today,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_log_newest_first() {
        let stdout = "Carol\t2026-05-03\nBob\t2026-02-01\nAlice\t2026-01-10\n";
        let history = parse_log(stdout).unwrap();
        assert_eq!(history.first_author, "Alice");
        assert_eq!(history.created, date("2026-01-10"));
        assert_eq!(history.updated, date("2026-05-03"));
    }

    #[test]
    fn test_parse_log_empty() {
        assert!(parse_log("").is_none());
        assert!(parse_log("garbage line\n").is_none());
    }

    #[test]
    fn test_inference_fallbacks() {
        let provider = InMemoryHistory::new();
        let today = date("2026-10-16");
        let inference = HistoryInference::new(&provider, today);
        let path = Path::new("specs/draft/0001-new.md");

        assert_eq!(inference.author_of(path).unwrap(), "Unknown");
        assert_eq!(inference.created_date_of(path).unwrap(), today);
        assert_eq!(inference.updated_date_of(path).unwrap(), today);
    }

    #[test]
    fn test_inference_uses_history() {
        let provider = InMemoryHistory::new().with_history(
            "0001-old.md",
            PathHistory {
                first_author: "Alice".to_string(),
                created: date("2025-01-01"),
                updated: date("2025-06-30"),
            },
        );
        let inference = HistoryInference::new(&provider, date("2026-10-16"));
        let path = Path::new("/corpus/final/0001-old.md");

        assert_eq!(inference.author_of(path).unwrap(), "Alice");
        assert_eq!(inference.created_date_of(path).unwrap(), date("2025-01-01"));
        assert_eq!(inference.updated_date_of(path).unwrap(), date("2025-06-30"));
    }

    #[test]
    fn test_in_memory_move_refuses_existing_destination() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.md");
        let b = dir.path().join("b.md");
        std::fs::write(&a, "a").unwrap();
        std::fs::write(&b, "b").unwrap();

        let provider = InMemoryHistory::new();
        assert!(provider.move_path(&a, &b).is_err());
        assert_eq!(std::fs::read_to_string(&b).unwrap(), "b");
        assert!(a.exists());
    }

    #[test]
    fn test_in_memory_move_carries_history() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.md");
        let b = dir.path().join("b.md");
        std::fs::write(&a, "a").unwrap();

        let provider = InMemoryHistory::new().with_history(
            &a,
            PathHistory {
                first_author: "Alice".to_string(),
                created: date("2025-01-01"),
                updated: date("2025-01-02"),
            },
        );
        provider.move_path(&a, &b).unwrap();
        assert!(b.exists());
        assert_eq!(provider.history(&b).unwrap().unwrap().first_author, "Alice");
        assert!(provider.history(&a).unwrap().is_none());
        assert_eq!(provider.moves().len(), 1);
    }
}
