//! Lifecycle orchestration.
//!
//! [`LifecycleController`] composes the codec, registry, mover, numbering,
//! history inference and index synchronizer into the user-facing
//! operations. Each operation either completes or returns an error; the
//! index is written last, so an interrupted operation is repaired by
//! [`resync_index`](LifecycleController::resync_index).

use crate::config::CorpusConfig;
use crate::corpus::{absolute, normalize_lexically, Corpus, TrackedDocument};
use crate::envelope::{Envelope, InferredFacts};
use crate::error::{LifecycleError, Result};
use crate::history::{HistoryInference, HistoryProvider};
use crate::index::{IndexDocument, DEFAULT_INDEX_TITLE};
use crate::mover::DocumentMover;
use crate::numbering::{assign_and_rename, format_number, next_number, number_prefix};
use crate::registry::{State, StateRegistry};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of a transition or a sync-to-header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub from_path: PathBuf,
    pub to_path: PathBuf,
    pub from_state: String,
    pub to_state: String,
    pub index_changed: bool,
}

/// Result of adding, indexing or re-heading a single document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    pub number: u32,
    pub state: String,
    /// Whether the document file was rewritten
    pub document_changed: bool,
    pub index_changed: bool,
}

/// Summary of a full index resynchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResyncReport {
    pub rows_added: usize,
    pub rows_updated: usize,
    pub bullets_added: usize,
    pub bullets_removed: usize,
    pub envelopes_reconciled: usize,
    /// Documents that could not be tracked (no number anywhere)
    pub skipped: Vec<PathBuf>,
    pub changed: bool,
}

/// Documents filed under one state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateListing {
    pub state: String,
    pub directory: String,
    pub documents: Vec<TrackedDocument>,
}

struct LoadedIndex {
    document: IndexDocument,
    /// Text read from disk; `None` when the index does not exist yet
    original: Option<String>,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| LifecycleError::io(path, e))
}

fn write(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| LifecycleError::io(path, e))
}

/// Top-level orchestrator over a corpus.
pub struct LifecycleController<H: HistoryProvider> {
    config: CorpusConfig,
    provider: H,
    today: NaiveDate,
}

impl<H: HistoryProvider> LifecycleController<H> {
    pub fn new(mut config: CorpusConfig, provider: H) -> Self {
        config.corpus_root = normalize_lexically(&config.corpus_root);
        config.index_path = normalize_lexically(&config.index_path);
        Self {
            config,
            provider,
            today: Local::now().date_naive(),
        }
    }

    /// Pin the date written to `updated` fields.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    pub fn provider(&self) -> &H {
        &self.provider
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    fn registry(&self) -> &StateRegistry {
        &self.config.registry
    }

    fn corpus(&self) -> Corpus<'_> {
        Corpus::new(&self.config)
    }

    fn mover(&self) -> DocumentMover<'_, H> {
        DocumentMover::new(&self.provider)
    }

    fn default_state(&self) -> Result<&State> {
        self.registry().resolve(&self.config.default_state)
    }

    fn existing_file(&self, path: &Path) -> Result<PathBuf> {
        let path = absolute(path)?;
        if !path.is_file() {
            return Err(LifecycleError::FileNotFound(path));
        }
        Ok(path)
    }

    fn previous_link(&self, path: &Path) -> Result<Option<String>> {
        let corpus = self.corpus();
        if corpus.contains(path) {
            corpus.link_for(path).map(Some)
        } else {
            Ok(None)
        }
    }

    // ── Index I/O ──────────────────────────────────────────────────────────

    fn load_index(&self) -> Result<LoadedIndex> {
        let path = &self.config.index_path;
        if path.is_file() {
            let text = read(path)?;
            Ok(LoadedIndex {
                document: IndexDocument::parse(&text),
                original: Some(text),
            })
        } else {
            debug!(path = %path.display(), "index missing, starting from skeleton");
            Ok(LoadedIndex {
                document: IndexDocument::skeleton(DEFAULT_INDEX_TITLE),
                original: None,
            })
        }
    }

    /// Normalize, then write the index when its text changed.
    fn store_index(&self, mut loaded: LoadedIndex, dry_run: bool) -> Result<bool> {
        loaded.document.normalize();
        let rendered = loaded.document.render();
        if loaded.original.as_deref() == Some(rendered.as_str()) {
            return Ok(false);
        }
        if dry_run {
            return Ok(true);
        }

        let path = &self.config.index_path;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LifecycleError::io(parent, e))?;
        }
        write(path, &rendered)?;
        info!(path = %path.display(), "index written");
        Ok(true)
    }

    /// Give `doc` its table row and a bullet in its own section only.
    /// Bullets for `previous_link` are dropped from every section.
    fn place(&self, index: &mut IndexDocument, doc: &TrackedDocument, previous_link: Option<&str>) {
        if index.row(doc.number).is_some() {
            index.update_table_row(doc.number, &doc.state, &doc.updated);
        } else {
            index.add_table_row(doc.index_row());
        }

        for state in self.registry().states() {
            let own = StateRegistry::same_state(&state.name, &doc.state);
            if let Some(previous) = previous_link {
                if previous != doc.link || !own {
                    index.remove_from_section(previous, &state.name);
                }
            }
            if !own {
                index.remove_from_section(&doc.link, &state.name);
            }
        }
        index.add_to_section(doc.section_entry(), &doc.state);
    }

    fn index_tracked(&self, doc: &TrackedDocument, previous_link: Option<&str>) -> Result<bool> {
        let mut loaded = self.load_index()?;
        self.place(&mut loaded.document, doc, previous_link);
        self.store_index(loaded, false)
    }

    // ── Numbers and envelopes ─────────────────────────────────────────────

    /// Next number past both the index table and the files on disk.
    fn next_free_number(&self) -> Result<u32> {
        let from_index = next_number(&self.load_index()?.document);
        let from_disk = self.corpus().max_number()?.map_or(1, |n| n + 1);
        Ok(from_index.max(from_disk))
    }

    fn number_for(&self, path: &Path, content: &str) -> Result<u32> {
        if let Ok(n) = Envelope::parse(content).and_then(|e| e.number()) {
            return Ok(n);
        }
        match number_prefix(&file_name(path), self.config.number_width) {
            Some(n) => Ok(n),
            None => self.next_free_number(),
        }
    }

    /// Another document already holding `number`: a file on disk, or an
    /// index entry when `path` is not yet filed under a state directory.
    fn number_owner(&self, number: u32, path: &Path) -> Result<Option<String>> {
        let corpus = self.corpus();
        let width = self.config.number_width;
        let on_disk = corpus
            .document_paths()?
            .into_iter()
            .map(|(p, _)| p)
            .find(|p| p != path && number_prefix(&file_name(p), width) == Some(number));
        if let Some(other) = on_disk {
            return Ok(Some(other.display().to_string()));
        }
        if corpus.locate(path).is_some() {
            return Ok(None);
        }

        let index = self.load_index()?.document;
        if index.row(number).is_none() {
            return Ok(None);
        }
        let target = index
            .entries()
            .find(|e| e.number == number)
            .map_or_else(|| self.config.index_path.display().to_string(), |e| e.target.clone());
        Ok(Some(target))
    }

    fn facts(&self, path: &Path, number: u32, state: &State) -> Result<InferredFacts> {
        let history = HistoryInference::new(&self.provider, self.today).infer(path)?;
        Ok(InferredFacts {
            number: format_number(number, self.config.number_width),
            author: history.first_author,
            created: history.created,
            updated: history.updated,
            state: state.name.clone(),
        })
    }

    /// Complete envelope for `content`, filed under its directory's state
    /// (or the default state when it is not state-located).
    fn synthesize_envelope(&self, path: &Path, content: &str) -> Result<String> {
        let state = match self.corpus().locate(path) {
            Some(state) => state,
            None => self.default_state()?,
        };
        let number = self.number_for(path, content)?;
        let facts = self.facts(path, number, state)?;
        Ok(Envelope::synthesize(&file_name(path), content, &facts))
    }

    // ── Operations ─────────────────────────────────────────────────────────

    /// Move a document to `target`, rewriting `state` and `updated`.
    ///
    /// The move happens before the envelope rewrite so a failed move leaves
    /// the document untouched.
    pub fn transition(&self, path: &Path, target: &str) -> Result<TransitionOutcome> {
        let path = self.existing_file(path)?;
        let mut content = read(&path)?;
        // A synthesized envelope is only written at the destination, once
        // the target has been validated.
        if !Envelope::has_envelope(&content) {
            content = self.synthesize_envelope(&path, &content)?;
            debug!(path = %path.display(), "synthesized envelope");
        }

        let envelope =
            Envelope::parse(&content).map_err(|e| LifecycleError::malformed(&path, e))?;
        let current = envelope
            .state()
            .ok_or_else(|| LifecycleError::MissingStateField(path.clone()))?
            .to_string();

        if StateRegistry::same_state(&current, target) {
            let state = self
                .registry()
                .lookup(&current)
                .map_or_else(|| current.clone(), |s| s.name.clone());
            return Err(LifecycleError::AlreadyInState { path, state });
        }
        let target_state = self.registry().resolve(target)?;

        let previous_link = self.previous_link(&path)?;
        let dest = self.config.state_dir(target_state).join(file_name(&path));
        if dest != path {
            self.mover().relocate(&path, &dest)?;
        }

        let updated = Envelope::update(&content, &target_state.name, self.today)
            .map_err(|e| LifecycleError::malformed(&dest, e))?;
        write(&dest, &updated)?;
        info!(
            path = %dest.display(),
            from = %current,
            to = %target_state.name,
            "transitioned document"
        );

        let doc = self.corpus().track(&dest, target_state, &updated)?;
        let index_changed = self.index_tracked(&doc, previous_link.as_deref())?;

        Ok(TransitionOutcome {
            from_path: path,
            to_path: dest,
            from_state: current,
            to_state: target_state.name.clone(),
            index_changed,
        })
    }

    /// Move a document into the directory named by its own `state` field.
    pub fn sync_to_header(&self, path: &Path) -> Result<TransitionOutcome> {
        let path = self.existing_file(path)?;
        let content = read(&path)?;
        let mut envelope =
            Envelope::parse(&content).map_err(|e| LifecycleError::malformed(&path, e))?;
        let header = envelope
            .state()
            .ok_or_else(|| LifecycleError::MissingStateField(path.clone()))?
            .to_string();
        let state = self.registry().resolve(&header)?;

        let dest = self.config.state_dir(state).join(file_name(&path));
        if dest == path {
            return Err(LifecycleError::AlreadyInCorrectDirectory {
                path,
                directory: state.directory.clone(),
            });
        }

        let from_state = self
            .corpus()
            .locate(&path)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let previous_link = self.previous_link(&path)?;
        self.mover().relocate(&path, &dest)?;

        let mut content = content;
        if header != state.name {
            envelope.set("state", &state.name);
            content = envelope.render();
            write(&dest, &content)?;
        }
        info!(path = %dest.display(), state = %state.name, "synced document to header");

        let doc = self.corpus().track(&dest, state, &content)?;
        let index_changed = self.index_tracked(&doc, previous_link.as_deref())?;

        Ok(TransitionOutcome {
            from_path: path,
            to_path: dest,
            from_state,
            to_state: state.name.clone(),
            index_changed,
        })
    }

    /// Onboard a file: number, file it, give it an envelope, register it
    /// with version control and index it.
    pub fn add_document(&self, path: &Path) -> Result<DocumentOutcome> {
        let mut path = self.existing_file(path)?;
        let original = read(&path)?;
        // History is keyed by the original location.
        let history = HistoryInference::new(&self.provider, self.today).infer(&path)?;
        let width = self.config.number_width;

        let number = match number_prefix(&file_name(&path), width) {
            Some(n) => {
                if let Some(owner) = self.number_owner(n, &path)? {
                    return Err(LifecycleError::NumberInUse {
                        path,
                        number: format_number(n, width),
                        owner,
                    });
                }
                n
            }
            None => {
                let n = self.next_free_number()?;
                path = assign_and_rename(&self.mover(), &path, n, width)?;
                info!(path = %path.display(), number = n, "assigned number");
                n
            }
        };

        let corpus = self.corpus();
        let state = match corpus.locate(&path) {
            Some(state) => state,
            None => {
                let state = self.default_state()?;
                let dest = self.config.state_dir(state).join(file_name(&path));
                self.mover().relocate(&path, &dest)?;
                path = dest;
                state
            }
        };

        let facts = InferredFacts {
            number: format_number(number, width),
            author: history.first_author,
            created: history.created,
            updated: history.updated,
            state: state.name.clone(),
        };
        let mut content = Envelope::synthesize(&file_name(&path), &original, &facts);

        let mut envelope =
            Envelope::parse(&content).map_err(|e| LifecycleError::malformed(&path, e))?;
        // The file name is authoritative for the number.
        if envelope.number().ok() != Some(number) {
            envelope.set("number", &facts.number);
            content = envelope.render();
            info!(path = %path.display(), number = %facts.number, "envelope number aligned with file name");
        }
        if envelope.state() != Some(state.name.as_str()) {
            content = Envelope::update(&content, &state.name, self.today)
                .map_err(|e| LifecycleError::malformed(&path, e))?;
            info!(path = %path.display(), state = %state.name, "envelope state reconciled with directory");
        }

        let document_changed = content != original;
        if document_changed {
            write(&path, &content)?;
        }

        self.provider.register(&path)?;
        info!(path = %path.display(), "registered document");

        let doc = corpus.track(&path, state, &content)?;
        let index_changed = self.index_tracked(&doc, None)?;

        Ok(DocumentOutcome {
            path,
            number: doc.number,
            state: state.name.clone(),
            document_changed,
            index_changed,
        })
    }

    /// Add an existing document to the table and its state section.
    ///
    /// A state-located document is filed under its directory; otherwise its
    /// envelope state decides.
    pub fn index_document(&self, path: &Path) -> Result<DocumentOutcome> {
        let path = self.existing_file(path)?;
        let content = read(&path)?;
        let envelope =
            Envelope::parse(&content).map_err(|e| LifecycleError::malformed(&path, e))?;

        let state = match self.corpus().locate(&path) {
            Some(state) => state,
            None => {
                let header = envelope
                    .state()
                    .ok_or_else(|| LifecycleError::MissingStateField(path.clone()))?;
                self.registry().resolve(header)?
            }
        };

        let doc = self.corpus().track(&path, state, &content)?;
        let index_changed = self.index_tracked(&doc, None)?;
        info!(path = %path.display(), number = doc.number, changed = index_changed, "indexed document");

        Ok(DocumentOutcome {
            path,
            number: doc.number,
            state: state.name.clone(),
            document_changed: false,
            index_changed,
        })
    }

    /// Synthesize or repair the envelope in place. Does not move or index.
    pub fn add_headers(&self, path: &Path) -> Result<DocumentOutcome> {
        let path = self.existing_file(path)?;
        let content = read(&path)?;
        let updated = self.synthesize_envelope(&path, &content)?;

        let envelope =
            Envelope::parse(&updated).map_err(|e| LifecycleError::malformed(&path, e))?;
        let number = envelope
            .number()
            .map_err(|e| LifecycleError::malformed(&path, e))?;
        let state = envelope.state().unwrap_or_default().to_string();

        let document_changed = updated != content;
        if document_changed {
            write(&path, &updated)?;
            info!(path = %path.display(), "envelope written");
        } else {
            debug!(path = %path.display(), "envelope already complete");
        }

        Ok(DocumentOutcome {
            path,
            number,
            state,
            document_changed,
            index_changed: false,
        })
    }

    /// Reconcile every document envelope with its directory, then the
    /// index with every document. With `check` nothing is written.
    pub fn resync_index(&self, check: bool) -> Result<ResyncReport> {
        let corpus = self.corpus();
        let mut report = ResyncReport::default();
        let mut docs = Vec::new();

        for (path, state) in corpus.document_paths()? {
            let mut content = read(&path)?;

            if let Ok(envelope) = Envelope::parse(&content) {
                if envelope.state() != Some(state.name.as_str()) {
                    content = Envelope::update(&content, &state.name, self.today)
                        .map_err(|e| LifecycleError::malformed(&path, e))?;
                    report.envelopes_reconciled += 1;
                    if !check {
                        write(&path, &content)?;
                        info!(
                            path = %path.display(),
                            was = envelope.state().unwrap_or_default(),
                            state = %state.name,
                            "envelope state reconciled with directory"
                        );
                    }
                }
            }

            match corpus.track(&path, state, &content) {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping untrackable document");
                    report.skipped.push(path);
                }
            }
        }

        let mut loaded = self.load_index()?;
        let counts = loaded.document.full_resync(&docs, self.registry());
        report.rows_added = counts.rows_added;
        report.rows_updated = counts.rows_updated;
        report.bullets_added = counts.entries_added;
        report.bullets_removed = counts.entries_removed;

        let index_changed = self.store_index(loaded, check)?;
        report.changed = index_changed || report.envelopes_reconciled > 0;

        info!(
            documents = docs.len(),
            rows_added = report.rows_added,
            rows_updated = report.rows_updated,
            bullets_added = report.bullets_added,
            bullets_removed = report.bullets_removed,
            envelopes = report.envelopes_reconciled,
            changed = report.changed,
            check,
            "index resync complete"
        );
        Ok(report)
    }

    /// Every registry state with the documents filed under it, sorted by
    /// number. States with no documents are included with an empty list.
    pub fn list_by_state(&self) -> Result<Vec<StateListing>> {
        let corpus = self.corpus();
        let mut listings: Vec<StateListing> = self
            .registry()
            .states()
            .iter()
            .map(|s| StateListing {
                state: s.name.clone(),
                directory: s.directory.clone(),
                documents: Vec::new(),
            })
            .collect();

        for (path, state) in corpus.document_paths()? {
            let content = read(&path)?;
            let doc = match corpus.track(&path, state, &content) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping untrackable document");
                    continue;
                }
            };
            if let Some(listing) = listings.iter_mut().find(|l| l.state == state.name) {
                listing.documents.push(doc);
            }
        }

        for listing in &mut listings {
            listing.documents.sort_by_key(|d| d.number);
        }
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::InMemoryHistory;
    use tempfile::TempDir;

    fn controller(dir: &TempDir) -> LifecycleController<InMemoryHistory> {
        let config = CorpusConfig::with_root(dir.path());
        LifecycleController::new(config, InMemoryHistory::new())
            .with_today(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let ctl = controller(&dir);
        let err = ctl
            .transition(&dir.path().join("specs/draft/0001-nope.md"), "Final")
            .unwrap_err();
        assert!(matches!(err, LifecycleError::FileNotFound(_)));
    }

    #[test]
    fn test_store_index_skips_identical_text() {
        let dir = TempDir::new().unwrap();
        let ctl = controller(&dir);
        let first = ctl.load_index().unwrap();
        assert!(ctl.store_index(first, false).unwrap());
        let second = ctl.load_index().unwrap();
        assert!(!ctl.store_index(second, false).unwrap());
    }

    #[test]
    fn test_next_free_number_considers_disk() {
        let dir = TempDir::new().unwrap();
        let ctl = controller(&dir);
        let draft = dir.path().join("specs/draft");
        std::fs::create_dir_all(&draft).unwrap();
        std::fs::write(draft.join("0007-unindexed.md"), "x").unwrap();
        assert_eq!(ctl.next_free_number().unwrap(), 8);
    }

    #[test]
    fn test_add_headers_fills_missing_fields_only() {
        let dir = TempDir::new().unwrap();
        let ctl = controller(&dir);
        let final_dir = dir.path().join("specs/final");
        std::fs::create_dir_all(&final_dir).unwrap();
        let path = final_dir.join("0003-partial.md");
        std::fs::write(&path, "---\ntitle: Kept Title\nauthor: Ada\n---\n# Other\n").unwrap();

        let outcome = ctl.add_headers(&path).unwrap();
        assert!(outcome.document_changed);
        assert_eq!(outcome.number, 3);
        assert_eq!(outcome.state, "Final");

        let envelope = Envelope::parse(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(envelope.title(), Some("Kept Title"));
        assert_eq!(envelope.get("author"), Some("Ada"));
        assert_eq!(envelope.get("number"), Some("0003"));
        assert_eq!(envelope.get("created"), Some("2026-10-16"));
        assert_eq!(envelope.get("supersedes"), Some("none"));

        assert!(!ctl.add_headers(&path).unwrap().document_changed);
    }
}
