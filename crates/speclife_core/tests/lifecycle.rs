use chrono::NaiveDate;
use speclife_core::{
    CorpusConfig, Envelope, IndexDocument, InMemoryHistory, LifecycleController, LifecycleError,
    PathHistory,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TODAY: &str = "2026-10-16";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn doc_text(number: u32, title: &str, state: &str) -> String {
    format!(
        "---\nnumber: {number:04}\ntitle: {title}\nauthor: Ada Lovelace\ncreated: 2026-01-01\nupdated: 2026-01-02\nstate: {state}\nsupersedes: none\nsuperseded-by: none\n---\n\n# {title}\n\nBody text.\n"
    )
}

struct Fixture {
    dir: TempDir,
    ctl: LifecycleController<InMemoryHistory>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_history(InMemoryHistory::new())
    }

    fn with_history(history: InMemoryHistory) -> Self {
        let dir = TempDir::new().expect("create temp corpus");
        let config = CorpusConfig::with_root(dir.path());
        let ctl = LifecycleController::new(config, history).with_today(today());
        Self { dir, ctl }
    }

    fn specs(&self) -> PathBuf {
        self.dir.path().join("specs")
    }

    fn write_doc(&self, state_dir: &str, number: u32, title: &str, state: &str) -> PathBuf {
        let dir = self.specs().join(state_dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{number:04}-{}.md", title.to_lowercase()));
        fs::write(&path, doc_text(number, title, state)).unwrap();
        path
    }

    /// Three documents, indexed.
    fn seeded() -> Self {
        let fx = Self::new();
        fx.write_doc("draft", 1, "Alpha", "Draft");
        fx.write_doc("draft", 2, "Beta", "Draft");
        fx.write_doc("final", 3, "Gamma", "Final");
        fx.ctl.resync_index(false).expect("initial resync");
        fx
    }

    fn index_text(&self) -> String {
        fs::read_to_string(self.specs().join("README.md")).expect("read index")
    }

    fn index(&self) -> IndexDocument {
        IndexDocument::parse(&self.index_text())
    }

    fn section(&self, state: &str) -> Vec<u32> {
        self.index()
            .section_entries(state)
            .iter()
            .map(|e| e.number)
            .collect()
    }
}

fn envelope_of(path: &Path) -> Envelope {
    Envelope::parse(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_initial_resync_builds_index() {
    let fx = Fixture::seeded();
    assert_eq!(
        fx.index_text(),
        "# Specification Index\n\
         \n\
         | Number | Title | State | Updated |\n\
         |--------|-------|-------|---------|\n\
         | 0001 | Alpha | Draft | 2026-01-02 |\n\
         | 0002 | Beta | Draft | 2026-01-02 |\n\
         | 0003 | Gamma | Final | 2026-01-02 |\n\
         \n\
         ## Documents by State\n\
         \n\
         ### Final\n\
         \n\
         - [0003 - Gamma](final/0003-gamma.md)\n\
         \n\
         ### Draft\n\
         \n\
         - [0001 - Alpha](draft/0001-alpha.md)\n\
         - [0002 - Beta](draft/0002-beta.md)\n"
    );
}

#[test]
fn test_transition_moves_rewrites_and_reindexes() {
    let fx = Fixture::seeded();
    let source = fx.specs().join("draft/0001-alpha.md");
    let before = fs::read_to_string(&source).unwrap();

    let outcome = fx.ctl.transition(&source, "Under Review").unwrap();

    let dest = fx.specs().join("under-review/0001-alpha.md");
    assert_eq!(outcome.to_path, dest);
    assert_eq!(outcome.from_state, "Draft");
    assert_eq!(outcome.to_state, "Under Review");
    assert!(outcome.index_changed);
    assert!(!source.exists());

    // Only state and updated differ.
    let expected = before
        .replace("state: Draft", "state: Under Review")
        .replace("updated: 2026-01-02", &format!("updated: {TODAY}"));
    assert_eq!(fs::read_to_string(&dest).unwrap(), expected);

    let index = fx.index();
    let row = index.row(1).unwrap();
    assert_eq!(row.state, "Under Review");
    assert_eq!(row.updated, TODAY);
    assert_eq!(row.title, "Alpha");
    assert_eq!(fx.section("Draft"), vec![2]);
    assert_eq!(fx.section("Under Review"), vec![1]);
    assert!(index
        .section_entries("Under Review")
        .iter()
        .any(|e| e.target == "under-review/0001-alpha.md"));
}

#[test]
fn test_transition_empties_and_drops_old_section() {
    let fx = Fixture::seeded();
    fx.ctl
        .transition(&fx.specs().join("final/0003-gamma.md"), "draft")
        .unwrap();

    assert!(!fx.index().section_names().contains(&"Final".to_string()));
    assert_eq!(fx.section("Draft"), vec![1, 2, 3]);
    assert!(!fx.index_text().contains("### Final"));
}

#[test]
fn test_transition_to_current_state_fails() {
    let fx = Fixture::seeded();
    let path = fx.specs().join("draft/0001-alpha.md");
    let before = fs::read_to_string(&path).unwrap();
    let index_before = fx.index_text();

    let err = fx.ctl.transition(&path, "DRAFT").unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyInState { .. }));
    assert!(err.to_string().contains("already in state Draft"));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
    assert_eq!(fx.index_text(), index_before);
}

#[test]
fn test_transition_to_unknown_state_lists_all_states() {
    let fx = Fixture::seeded();
    let err = fx
        .ctl
        .transition(&fx.specs().join("draft/0001-alpha.md"), "InProgress")
        .unwrap_err();

    match &err {
        LifecycleError::UnsupportedState { state, valid } => {
            assert_eq!(state, "InProgress");
            assert_eq!(valid.len(), 10);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let msg = err.to_string();
    for name in ["Accepted", "Draft", "Obsolete", "Under Review", "Withdrawn"] {
        assert!(msg.contains(name), "{name} missing from {msg}");
    }
    assert!(err.is_user_error());
}

#[test]
fn test_transition_backward_is_allowed() {
    let fx = Fixture::seeded();
    let outcome = fx
        .ctl
        .transition(&fx.specs().join("final/0003-gamma.md"), "Under-Review")
        .unwrap();
    assert_eq!(outcome.to_state, "Under Review");
    assert_eq!(
        envelope_of(&outcome.to_path).state(),
        Some("Under Review")
    );
}

#[test]
fn test_failed_move_changes_nothing() {
    let fx = Fixture::seeded();
    let path = fx.specs().join("draft/0002-beta.md");
    let before = fs::read_to_string(&path).unwrap();
    let index_before = fx.index_text();

    fx.ctl.provider().reject_moves("fatal: bad source");
    let err = fx.ctl.transition(&path, "Final").unwrap_err();

    match err {
        LifecycleError::MoveFailure { reason, .. } => assert!(reason.contains("bad source")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
    assert_eq!(fx.index_text(), index_before);
}

#[test]
fn test_transition_refuses_existing_destination() {
    let fx = Fixture::seeded();
    let clash = fx.specs().join("final/0001-alpha.md");
    fs::write(&clash, "occupied").unwrap();

    let err = fx
        .ctl
        .transition(&fx.specs().join("draft/0001-alpha.md"), "Final")
        .unwrap_err();
    assert!(matches!(err, LifecycleError::MoveFailure { .. }));
    assert_eq!(fs::read_to_string(&clash).unwrap(), "occupied");
}

#[test]
fn test_transition_synthesizes_missing_envelope() {
    let fx = Fixture::seeded();
    let path = fx.specs().join("draft/0005-bare.md");
    fs::write(&path, "# Bare Document\n\nNo envelope yet.\n").unwrap();

    let outcome = fx.ctl.transition(&path, "Accepted").unwrap();
    let envelope = envelope_of(&outcome.to_path);
    assert_eq!(envelope.state(), Some("Accepted"));
    assert_eq!(envelope.get("number"), Some("0005"));
    assert_eq!(envelope.title(), Some("Bare Document"));
    assert_eq!(envelope.get("author"), Some("Unknown"));
    assert!(envelope.body().contains("No envelope yet."));
    assert_eq!(fx.section("Accepted"), vec![5]);
    assert_eq!(fx.index().row(5).unwrap().state, "Accepted");
}

#[test]
fn test_rejected_transition_leaves_bare_document_untouched() {
    let fx = Fixture::seeded();
    let path = fx.specs().join("draft/0005-bare.md");
    let original = "# Bare Document\n\nNo envelope yet.\n";
    fs::write(&path, original).unwrap();
    let index_before = fx.index_text();

    let err = fx.ctl.transition(&path, "InProgress").unwrap_err();
    assert!(matches!(err, LifecycleError::UnsupportedState { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), original);

    let err = fx.ctl.transition(&path, "draft").unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyInState { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
    assert_eq!(fx.index_text(), index_before);
}

#[test]
fn test_transition_missing_state_field() {
    let fx = Fixture::seeded();
    let path = fx.specs().join("draft/0006-stateless.md");
    fs::write(&path, "---\nnumber: 0006\ntitle: Stateless\n---\nbody\n").unwrap();

    let err = fx.ctl.transition(&path, "Final").unwrap_err();
    assert!(matches!(err, LifecycleError::MissingStateField(_)));
}

#[test]
fn test_transition_missing_file() {
    let fx = Fixture::seeded();
    let err = fx
        .ctl
        .transition(&fx.specs().join("draft/0099-ghost.md"), "Final")
        .unwrap_err();
    assert!(matches!(err, LifecycleError::FileNotFound(_)));
}

#[test]
fn test_sync_to_header_already_correct() {
    let fx = Fixture::seeded();
    let err = fx
        .ctl
        .sync_to_header(&fx.specs().join("final/0003-gamma.md"))
        .unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyInCorrectDirectory { .. }));
    assert!(err.to_string().contains("already in the correct directory"));
}

#[test]
fn test_sync_to_header_moves_to_envelope_state() {
    let fx = Fixture::seeded();
    let path = fx.specs().join("draft/0002-beta.md");
    let content = fs::read_to_string(&path).unwrap().replace("state: Draft", "state: deferred");
    fs::write(&path, content).unwrap();

    let outcome = fx.ctl.sync_to_header(&path).unwrap();
    let dest = fx.specs().join("deferred/0002-beta.md");
    assert_eq!(outcome.to_path, dest);
    assert_eq!(outcome.from_state, "Draft");
    assert_eq!(envelope_of(&dest).state(), Some("Deferred"));
    assert_eq!(envelope_of(&dest).updated(), Some("2026-01-02"));
    assert_eq!(fx.section("Deferred"), vec![2]);
    assert_eq!(fx.section("Draft"), vec![1]);
    assert_eq!(fx.index().row(2).unwrap().state, "Deferred");
}

#[test]
fn test_sync_to_header_without_envelope() {
    let fx = Fixture::seeded();
    let path = fx.specs().join("draft/0007-plain.md");
    fs::write(&path, "plain text\n").unwrap();
    let err = fx.ctl.sync_to_header(&path).unwrap_err();
    assert!(matches!(err, LifecycleError::MalformedEnvelope { .. }));
}

#[test]
fn test_add_document_onboards_unnumbered_file() {
    let history = InMemoryHistory::new().with_history(
        "new-idea.md",
        PathHistory {
            first_author: "Grace Hopper".to_string(),
            created: date("2026-03-01"),
            updated: date("2026-03-05"),
        },
    );
    let fx = Fixture::with_history(history);
    fx.write_doc("draft", 1, "Alpha", "Draft");
    fx.write_doc("final", 3, "Gamma", "Final");
    fx.ctl.resync_index(false).unwrap();

    let inbox = fx.dir.path().join("inbox");
    fs::create_dir_all(&inbox).unwrap();
    let source = inbox.join("new-idea.md");
    fs::write(&source, "# New Idea\n\nSomething worth specifying.\n").unwrap();

    let outcome = fx.ctl.add_document(&source).unwrap();

    let dest = fx.specs().join("draft/0004-new-idea.md");
    assert_eq!(outcome.path, dest);
    assert_eq!(outcome.number, 4);
    assert_eq!(outcome.state, "Draft");
    assert!(!source.exists());

    let envelope = envelope_of(&dest);
    assert_eq!(envelope.get("number"), Some("0004"));
    assert_eq!(envelope.title(), Some("New Idea"));
    assert_eq!(envelope.get("author"), Some("Grace Hopper"));
    assert_eq!(envelope.get("created"), Some("2026-03-01"));
    assert_eq!(envelope.get("updated"), Some("2026-03-05"));
    assert_eq!(envelope.state(), Some("Draft"));
    assert_eq!(envelope.get("supersedes"), Some("none"));
    assert_eq!(envelope.get("superseded-by"), Some("none"));
    assert!(envelope.body().contains("Something worth specifying."));

    assert_eq!(fx.ctl.provider().registered(), vec![dest.clone()]);

    let index = fx.index();
    let row = index.row(4).unwrap();
    assert_eq!(row.title, "New Idea");
    assert_eq!(row.state, "Draft");
    assert_eq!(fx.section("Draft"), vec![1, 4]);
}

#[test]
fn test_add_document_without_history_defaults() {
    let fx = Fixture::new();
    let source = fx.dir.path().join("fresh.md");
    fs::write(&source, "no heading here\n").unwrap();

    let outcome = fx.ctl.add_document(&source).unwrap();
    assert_eq!(outcome.number, 1);

    let envelope = envelope_of(&outcome.path);
    assert_eq!(envelope.get("author"), Some("Unknown"));
    assert_eq!(envelope.get("created"), Some(TODAY));
    assert_eq!(envelope.title(), Some("Fresh"));
    // Index created from scratch.
    assert!(fx.index_text().starts_with("# Specification Index\n"));
    assert_eq!(fx.section("Draft"), vec![1]);
}

#[test]
fn test_add_document_reconciles_header_with_directory() {
    let fx = Fixture::seeded();
    let path = fx.write_doc("accepted", 8, "Theta", "Final");

    let outcome = fx.ctl.add_document(&path).unwrap();
    assert_eq!(outcome.path, path);
    assert_eq!(outcome.state, "Accepted");
    assert_eq!(envelope_of(&path).state(), Some("Accepted"));
    assert_eq!(envelope_of(&path).updated(), Some(TODAY));
    assert_eq!(fx.section("Accepted"), vec![8]);
    assert_eq!(fx.section("Final"), vec![3]);
}

#[test]
fn test_add_document_renumbers_envelope_of_unnumbered_file() {
    let fx = Fixture::seeded();
    let source = fx.dir.path().join("template-copy.md");
    fs::write(&source, doc_text(2, "New Thing", "Draft")).unwrap();

    let outcome = fx.ctl.add_document(&source).unwrap();

    let dest = fx.specs().join("draft/0004-template-copy.md");
    assert_eq!(outcome.path, dest);
    assert_eq!(outcome.number, 4);
    let envelope = envelope_of(&dest);
    assert_eq!(envelope.get("number"), Some("0004"));
    assert_eq!(envelope.title(), Some("New Thing"));
    assert_eq!(envelope.get("author"), Some("Ada Lovelace"));

    let index = fx.index();
    assert_eq!(index.row(2).unwrap().title, "Beta");
    assert_eq!(index.row(4).unwrap().title, "New Thing");
    assert_eq!(fx.section("Draft"), vec![1, 2, 4]);
}

#[test]
fn test_add_document_rejects_number_held_by_indexed_document() {
    let fx = Fixture::seeded();
    let inbox = fx.dir.path().join("inbox");
    fs::create_dir_all(&inbox).unwrap();
    let source = inbox.join("0002-other.md");
    fs::write(&source, "# Other\n").unwrap();
    let index_before = fx.index_text();

    let err = fx.ctl.add_document(&source).unwrap_err();
    match &err {
        LifecycleError::NumberInUse { number, owner, .. } => {
            assert_eq!(number, "0002");
            assert!(owner.ends_with("0002-beta.md"), "owner: {owner}");
        }
        other => panic!("expected NumberInUse, got {other:?}"),
    }
    assert!(err.is_user_error());
    assert_eq!(fs::read_to_string(&source).unwrap(), "# Other\n");
    assert_eq!(fx.index_text(), index_before);
    assert!(fx.ctl.provider().registered().is_empty());
}

#[test]
fn test_add_document_rejects_number_held_by_file_on_disk() {
    let fx = Fixture::seeded();
    let path = fx.write_doc("accepted", 3, "Clash", "Accepted");
    let index_before = fx.index_text();

    let err = fx.ctl.add_document(&path).unwrap_err();
    assert!(matches!(err, LifecycleError::NumberInUse { .. }));
    assert_eq!(fx.index_text(), index_before);
    assert_eq!(fx.index().row(3).unwrap().title, "Gamma");
    assert_eq!(fx.section("Accepted"), Vec::<u32>::new());
}

#[test]
fn test_index_document_is_idempotent() {
    let fx = Fixture::seeded();
    let path = fx.write_doc("active", 9, "Iota", "Active");

    let first = fx.ctl.index_document(&path).unwrap();
    assert!(first.index_changed);
    let text = fx.index_text();

    let second = fx.ctl.index_document(&path).unwrap();
    assert!(!second.index_changed);
    assert_eq!(fx.index_text(), text);
    assert_eq!(fx.section("Active"), vec![9]);
}

#[test]
fn test_resync_after_manual_move() {
    let fx = Fixture::seeded();
    let old = fx.specs().join("draft/0002-beta.md");
    let new = fx.specs().join("final/0002-beta.md");
    fs::rename(&old, &new).unwrap();

    let report = fx.ctl.resync_index(false).unwrap();
    assert!(report.changed);
    assert_eq!(report.envelopes_reconciled, 1);
    assert_eq!(report.rows_updated, 1);
    assert_eq!(report.rows_added, 0);
    assert_eq!(report.bullets_removed, 1);
    assert_eq!(report.bullets_added, 1);

    assert_eq!(envelope_of(&new).state(), Some("Final"));
    assert_eq!(envelope_of(&new).updated(), Some(TODAY));
    let row = fx.index().row(2).unwrap().clone();
    assert_eq!(row.state, "Final");
    assert_eq!(row.updated, TODAY);
    assert_eq!(fx.section("Draft"), vec![1]);
    assert_eq!(fx.section("Final"), vec![2, 3]);

    let text = fx.index_text();
    let again = fx.ctl.resync_index(false).unwrap();
    assert!(!again.changed, "second resync reported changes: {again:?}");
    assert_eq!(again.rows_updated + again.bullets_added + again.bullets_removed, 0);
    assert_eq!(fx.index_text(), text);
}

#[test]
fn test_resync_removes_bullets_for_deleted_files() {
    let fx = Fixture::seeded();
    fs::remove_file(fx.specs().join("draft/0001-alpha.md")).unwrap();

    let report = fx.ctl.resync_index(false).unwrap();
    assert_eq!(report.bullets_removed, 1);
    assert_eq!(fx.section("Draft"), vec![2]);
    // Rows are kept; numbers are never reused.
    assert!(fx.index().row(1).is_some());
}

#[test]
fn test_resync_heals_formatting() {
    let fx = Fixture::seeded();
    let messy = fx
        .index_text()
        .replace("## Documents by State\n", "## Documents by State\n\n\n\n")
        .replace(
            "- [0001 - Alpha](draft/0001-alpha.md)\n",
            "- [0001 - Alpha](draft/0001-alpha.md)\n\n",
        );
    fs::write(fx.specs().join("README.md"), &messy).unwrap();

    let report = fx.ctl.resync_index(false).unwrap();
    assert!(report.changed);
    assert!(!fx.index_text().contains("\n\n\n"));
    assert!(fx
        .index_text()
        .contains("- [0001 - Alpha](draft/0001-alpha.md)\n- [0002 - Beta](draft/0002-beta.md)\n"));
}

#[test]
fn test_resync_check_writes_nothing() {
    let fx = Fixture::new();
    fx.write_doc("draft", 1, "Alpha", "Draft");
    let misfiled = fx.write_doc("final", 2, "Beta", "Draft");
    let before = fs::read_to_string(&misfiled).unwrap();

    let report = fx.ctl.resync_index(true).unwrap();
    assert!(report.changed);
    assert_eq!(report.rows_added, 2);
    assert_eq!(report.envelopes_reconciled, 1);
    assert!(!fx.specs().join("README.md").exists());
    assert_eq!(fs::read_to_string(&misfiled).unwrap(), before);
}

#[test]
fn test_resync_skips_unnumbered_documents() {
    let fx = Fixture::seeded();
    let stray = fx.specs().join("draft/scratch.md");
    fs::write(&stray, "notes\n").unwrap();

    let report = fx.ctl.resync_index(false).unwrap();
    assert_eq!(report.skipped, vec![stray]);
    assert!(!report.changed);
}

#[test]
fn test_list_by_state() {
    let fx = Fixture::seeded();
    let listings = fx.ctl.list_by_state().unwrap();
    assert_eq!(listings.len(), 10);
    assert_eq!(listings[0].state, "Draft");

    let draft: Vec<u32> = listings[0].documents.iter().map(|d| d.number).collect();
    assert_eq!(draft, vec![1, 2]);
    let final_docs = listings.iter().find(|l| l.state == "Final").unwrap();
    assert_eq!(final_docs.documents[0].title, "Gamma");
    assert!(listings
        .iter()
        .filter(|l| l.state != "Draft" && l.state != "Final")
        .all(|l| l.documents.is_empty()));
}

#[test]
fn test_custom_state_set() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("speclife.toml"),
        "corpus_root = \"rfcs\"\ndefault_state = \"Proposed\"\n\n[[states]]\nname = \"Proposed\"\ndirectory = \"proposed\"\n\n[[states]]\nname = \"Done\"\ndirectory = \"done\"\n",
    )
    .unwrap();
    let config = CorpusConfig::discover(None, dir.path()).unwrap();
    let ctl = LifecycleController::new(config, InMemoryHistory::new()).with_today(today());

    let source = dir.path().join("idea.md");
    fs::write(&source, "# Idea\n").unwrap();
    let added = ctl.add_document(&source).unwrap();
    assert_eq!(added.path, dir.path().join("rfcs/proposed/0001-idea.md"));

    let moved = ctl.transition(&added.path, "done").unwrap();
    assert_eq!(moved.to_path, dir.path().join("rfcs/done/0001-idea.md"));

    let err = ctl.transition(&moved.to_path, "Draft").unwrap_err();
    match err {
        LifecycleError::UnsupportedState { valid, .. } => {
            assert_eq!(valid, vec!["Done".to_string(), "Proposed".to_string()])
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
