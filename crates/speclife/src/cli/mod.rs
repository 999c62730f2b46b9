//! Command-line interface for speclife.
//!
//! Each command resolves the corpus configuration, builds a git-backed
//! [`LifecycleController`](speclife_core::LifecycleController), runs one
//! operation and prints the outcome.

pub mod error;
pub mod output;

pub mod config;
pub mod context;
pub mod document;
pub mod list;
pub mod states;
pub mod transition;
pub mod update_index;
