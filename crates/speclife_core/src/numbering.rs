//! Sequential document numbers.
//!
//! Numbers are fixed-width and zero-padded (`0015`). The next number is one
//! past the highest number in the index table; gaps are never reused.

use crate::error::Result;
use crate::history::HistoryProvider;
use crate::index::IndexDocument;
use crate::mover::DocumentMover;
use std::path::{Path, PathBuf};

/// Zero-pad `number` to `width` digits.
pub fn format_number(number: u32, width: usize) -> String {
    format!("{number:0width$}")
}

/// Leading fixed-width number of `file_name`, if it has one.
pub fn number_prefix(file_name: &str, width: usize) -> Option<u32> {
    let prefix = file_name.get(..width)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if file_name[width..].starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

pub fn has_number_prefix(file_name: &str, width: usize) -> bool {
    number_prefix(file_name, width).is_some()
}

/// One past the highest number in the index table (1 for an empty table).
pub fn next_number(index: &IndexDocument) -> u32 {
    index
        .rows()
        .map(|row| row.number)
        .max()
        .map_or(1, |max| max + 1)
}

/// Rename `path` to `<padded number>-<file name>` in the same directory.
pub fn assign_and_rename<H: HistoryProvider + ?Sized>(
    mover: &DocumentMover<'_, H>,
    path: &Path,
    number: u32,
    width: usize,
) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let renamed = path.with_file_name(format!("{}-{}", format_number(number, width), file_name));
    mover.relocate(path, &renamed)?;
    Ok(renamed)
}
