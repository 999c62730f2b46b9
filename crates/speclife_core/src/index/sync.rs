//! Table and section edits, and full reconciliation against the corpus.

use super::model::{
    IndexDocument, IndexRow, Node, SectionEntry, BY_STATE_HEADING, BY_STATE_LEVEL, SECTION_LEVEL,
    TABLE_HEADER, TABLE_SEPARATOR,
};
use crate::corpus::TrackedDocument;
use crate::registry::StateRegistry;
use serde::Serialize;

/// Edits made by [`IndexDocument::full_resync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncCounts {
    pub rows_added: usize,
    pub rows_updated: usize,
    pub entries_added: usize,
    pub entries_removed: usize,
    pub reordered: bool,
}

impl SyncCounts {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn is_separator(node: &Node) -> bool {
    match node {
        Node::Text(line) => {
            let t = line.trim();
            t.starts_with('|')
                && t.contains('-')
                && t.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
        }
        _ => false,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RunKind {
    Row,
    Bullet,
}

fn run_kind(node: &Node) -> Option<RunKind> {
    match node {
        Node::TableRow(_) => Some(RunKind::Row),
        Node::Bullet(_) => Some(RunKind::Bullet),
        _ => None,
    }
}

fn node_number(node: &Node) -> u32 {
    match node {
        Node::TableRow(row) => row.number,
        Node::Bullet(entry) => entry.number,
        _ => 0,
    }
}

impl IndexDocument {
    fn by_state_index(&self) -> Option<usize> {
        self.nodes.iter().position(|n| {
            matches!(n, Node::Heading { level, text }
                if *level == BY_STATE_LEVEL && StateRegistry::same_state(text, BY_STATE_HEADING))
        })
    }

    fn by_state_end(&self, start: usize) -> usize {
        (start + 1..self.nodes.len())
            .find(|&i| matches!(&self.nodes[i], Node::Heading { level, .. } if *level <= BY_STATE_LEVEL))
            .unwrap_or(self.nodes.len())
    }

    fn ensure_by_state_heading(&mut self) -> usize {
        if let Some(idx) = self.by_state_index() {
            return idx;
        }
        if self.nodes.last().is_some_and(|n| !n.is_blank()) {
            self.nodes.push(Node::Blank);
        }
        self.nodes.push(Node::heading(BY_STATE_LEVEL, BY_STATE_HEADING));
        self.nodes.len() - 1
    }

    /// `(heading, end)` of the section for `state`; `end` is exclusive.
    fn section_bounds(&self, state: &str) -> Option<(usize, usize)> {
        let start = self.by_state_index()?;
        let region_end = self.by_state_end(start);
        let (heading, level) = (start + 1..region_end).find_map(|i| match &self.nodes[i] {
            Node::Heading { level, text }
                if *level > BY_STATE_LEVEL && StateRegistry::same_state(text, state) =>
            {
                Some((i, *level))
            }
            _ => None,
        })?;
        let end = (heading + 1..region_end)
            .find(|&i| matches!(&self.nodes[i], Node::Heading { level: l, .. } if *l <= level))
            .unwrap_or(region_end);
        Some((heading, end))
    }

    /// Headings of every per-state section, in file order.
    pub fn section_names(&self) -> Vec<String> {
        let Some(start) = self.by_state_index() else {
            return Vec::new();
        };
        let end = self.by_state_end(start);
        self.nodes[start + 1..end]
            .iter()
            .filter_map(|n| match n {
                Node::Heading { level, text } if *level > BY_STATE_LEVEL => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Bullets listed under the section for `state`.
    pub fn section_entries(&self, state: &str) -> Vec<&SectionEntry> {
        let Some((heading, end)) = self.section_bounds(state) else {
            return Vec::new();
        };
        self.nodes[heading + 1..end]
            .iter()
            .filter_map(|n| match n {
                Node::Bullet(entry) => Some(entry),
                _ => None,
            })
            .collect()
    }

    /// First index after the table separator, creating the table header if
    /// the index has none.
    fn table_body_start(&mut self) -> usize {
        if let Some(sep) = self.nodes.iter().position(is_separator) {
            return sep + 1;
        }

        let at = self.by_state_index().unwrap_or(self.nodes.len());
        let mut block = Vec::new();
        if at > 0 && !self.nodes[at - 1].is_blank() {
            block.push(Node::Blank);
        }
        block.push(Node::Text(TABLE_HEADER.to_string()));
        block.push(Node::Text(TABLE_SEPARATOR.to_string()));
        let body = at + block.len();
        block.push(Node::Blank);
        self.nodes.splice(at..at, block);
        body
    }

    /// Insert a table row in ascending number order. No-op when a row with
    /// that number already exists.
    pub fn add_table_row(&mut self, row: IndexRow) -> bool {
        if self.row(row.number).is_some() {
            return false;
        }

        let row_positions: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n, Node::TableRow(_)))
            .map(|(i, _)| i)
            .collect();

        let pos = row_positions
            .iter()
            .copied()
            .find(|&i| node_number(&self.nodes[i]) > row.number)
            .or_else(|| row_positions.last().map(|last| last + 1))
            .unwrap_or_else(|| self.table_body_start());

        self.nodes.insert(pos, Node::TableRow(row));
        true
    }

    /// Rewrite state and updated of the row for `number`, leaving every
    /// other column alone. Returns whether the row changed.
    pub fn update_table_row(&mut self, number: u32, state: &str, updated: &str) -> bool {
        self.row_mut(number)
            .is_some_and(|row| row.set_state(state, updated))
    }

    /// Insert a bullet into the section for `state`, creating the section
    /// directly under the by-state heading when it does not exist yet.
    pub fn add_to_section(&mut self, entry: SectionEntry, state: &str) -> bool {
        let (heading, end) = match self.section_bounds(state) {
            Some((heading, end)) => {
                let listed = self.nodes[heading + 1..end]
                    .iter()
                    .any(|n| matches!(n, Node::Bullet(e) if e.points_to(&entry.target)));
                if listed {
                    return false;
                }
                (heading, end)
            }
            None => {
                let start = self.ensure_by_state_heading();
                self.nodes
                    .splice(start + 1..start + 1, [Node::Blank, Node::heading(SECTION_LEVEL, state)]);
                (start + 2, start + 3)
            }
        };

        let bullets: Vec<usize> = (heading + 1..end)
            .filter(|&i| matches!(self.nodes[i], Node::Bullet(_)))
            .collect();

        if bullets.is_empty() {
            let mut block = vec![Node::Blank, Node::Bullet(entry)];
            if self.nodes.get(heading + 1).is_some_and(|n| !n.is_blank()) {
                block.push(Node::Blank);
            }
            self.nodes.splice(heading + 1..heading + 1, block);
            return true;
        }

        let pos = bullets
            .iter()
            .copied()
            .find(|&i| node_number(&self.nodes[i]) > entry.number)
            .unwrap_or_else(|| bullets[bullets.len() - 1] + 1);
        self.nodes.insert(pos, Node::Bullet(entry));
        true
    }

    /// Remove the bullet linking to `target` from the section for `state`.
    /// A section left without entries loses its heading too.
    pub fn remove_from_section(&mut self, target: &str, state: &str) -> bool {
        let Some((heading, end)) = self.section_bounds(state) else {
            return false;
        };
        let Some(pos) = (heading + 1..end)
            .find(|&i| matches!(&self.nodes[i], Node::Bullet(e) if e.points_to(target)))
        else {
            return false;
        };

        self.nodes.remove(pos);
        let end = end - 1;
        if self.nodes[heading + 1..end].iter().all(Node::is_blank) {
            self.nodes.drain(heading..end);
        }
        true
    }

    /// Sort every contiguous run of table rows and of bullets by number.
    fn sort_runs(&mut self) -> bool {
        let mut changed = false;
        let mut i = 0;
        while i < self.nodes.len() {
            let Some(kind) = run_kind(&self.nodes[i]) else {
                i += 1;
                continue;
            };
            let mut j = i + 1;
            while j < self.nodes.len() && run_kind(&self.nodes[j]) == Some(kind) {
                j += 1;
            }
            let run = &mut self.nodes[i..j];
            if !run.windows(2).all(|w| node_number(&w[0]) <= node_number(&w[1])) {
                run.sort_by_key(node_number);
                changed = true;
            }
            i = j;
        }
        changed
    }

    /// Reconcile the table and every registry section with `docs`, the
    /// complete set of documents found in state directories.
    pub fn full_resync(&mut self, docs: &[TrackedDocument], registry: &StateRegistry) -> SyncCounts {
        let mut counts = SyncCounts::default();

        let mut ordered: Vec<&TrackedDocument> = docs.iter().collect();
        ordered.sort_by_key(|d| d.number);

        for doc in &ordered {
            match self.row(doc.number) {
                None => {
                    self.add_table_row(doc.index_row());
                    counts.rows_added += 1;
                }
                Some(_) => {
                    if self.update_table_row(doc.number, &doc.state, &doc.updated) {
                        counts.rows_updated += 1;
                    }
                }
            }
        }

        for state in registry.states() {
            let members: Vec<&TrackedDocument> = ordered
                .iter()
                .copied()
                .filter(|d| StateRegistry::same_state(&d.state, &state.name))
                .collect();

            let mut seen: Vec<String> = Vec::new();
            let mut stale: Vec<String> = Vec::new();
            for entry in self.section_entries(&state.name) {
                let is_member = members.iter().any(|m| entry.points_to(&m.link));
                let duplicate = seen.iter().any(|t| entry.points_to(t));
                if !is_member || duplicate {
                    stale.push(entry.target.clone());
                } else {
                    seen.push(entry.target.clone());
                }
            }
            for target in stale {
                if self.remove_from_section(&target, &state.name) {
                    counts.entries_removed += 1;
                }
            }

            for member in members {
                if self.add_to_section(member.section_entry(), &state.name) {
                    counts.entries_added += 1;
                }
            }
        }

        counts.reordered = self.sort_runs();
        counts
    }
}
