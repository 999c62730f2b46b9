//! Aggregate index: model, formatting and synchronization.

mod format;
mod model;
mod sync;

pub use format::normalize_nodes;
pub use model::{
    normalize_link, IndexDocument, IndexRow, Node, SectionEntry, BY_STATE_HEADING, TABLE_HEADER,
    TABLE_SEPARATOR,
};
pub use sync::SyncCounts;

/// Title used when an index has to be created from scratch.
pub const DEFAULT_INDEX_TITLE: &str = "Specification Index";
