//! Speclife Core - Document Lifecycle & Index Synchronization
//!
//! A corpus of numbered specification documents lives under a single root,
//! one directory per lifecycle state. Each document opens with a metadata
//! envelope, and an aggregate index mirrors the corpus twice: as a table
//! sorted by number and as per-state bulleted sections.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │ LifecycleController  │  transition / sync / add / resync
//! └──────────┬───────────┘
//!            │
//!   ┌────────┼───────────────┬──────────────────┐
//!   ▼        ▼               ▼                  ▼
//! Envelope  StateRegistry   IndexDocument      HistoryProvider
//! (codec)   (config)        (+ normalizer)     (git mv / git log)
//! ```
//!
//! # Core Concepts
//!
//! - **Envelope**: `---` delimited `key: value` block at the top of a document
//! - **State directory**: the directory whose name encodes a document's state;
//!   authoritative when the envelope disagrees
//! - **Aggregate index**: table + "Documents by State" sections, rewritten only
//!   through [`IndexDocument`]

pub mod config;
pub mod corpus;
pub mod envelope;
pub mod error;
pub mod history;
pub mod index;
pub mod lifecycle;
pub mod mover;
pub mod numbering;
pub mod registry;

// Re-exports for convenience
pub use config::{ConfigError, CorpusConfig};
pub use corpus::{Corpus, TrackedDocument};
pub use envelope::{Envelope, EnvelopeError, InferredFacts};
pub use error::{LifecycleError, Result};
pub use history::{
    GitHistory, HistoryError, HistoryInference, HistoryProvider, InMemoryHistory, PathHistory,
};
pub use index::{normalize_nodes, IndexDocument, IndexRow, Node, SectionEntry, SyncCounts};
pub use lifecycle::{
    DocumentOutcome, LifecycleController, ResyncReport, StateListing, TransitionOutcome,
};
pub use mover::DocumentMover;
pub use registry::{State, StateRegistry};
