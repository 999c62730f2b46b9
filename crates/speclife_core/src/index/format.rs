//! Whitespace normalization for the index.
//!
//! Runs after every structural edit so formatting drift heals itself:
//! - a run of blank lines touching a heading collapses to exactly one
//! - blank lines between two list items of the same list are removed

use super::model::{IndexDocument, Node};

/// Normalize a node sequence. Idempotent.
pub fn normalize_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    let mut iter = nodes.into_iter().peekable();

    while let Some(node) = iter.next() {
        if !node.is_blank() {
            out.push(node);
            continue;
        }

        let mut run = 1;
        while iter.peek().is_some_and(Node::is_blank) {
            iter.next();
            run += 1;
        }

        let prev = out.last();
        let next = iter.peek();
        let between_items = prev.is_some_and(Node::is_list_item) && next.is_some_and(Node::is_list_item);
        let touches_heading = prev.is_some_and(Node::is_heading) || next.is_some_and(Node::is_heading);

        let keep = if between_items {
            0
        } else if touches_heading {
            1
        } else {
            run
        };
        out.extend(std::iter::repeat(Node::Blank).take(keep));
    }

    out
}

impl IndexDocument {
    /// Apply [`normalize_nodes`] in place.
    pub fn normalize(&mut self) {
        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = normalize_nodes(nodes);
    }
}
