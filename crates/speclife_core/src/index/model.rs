//! Structured model of the aggregate index.
//!
//! The index is parsed line by line into [`Node`]s. Table data rows and
//! section bullets become typed nodes; everything else (prose, the table
//! header and separator) is kept verbatim as [`Node::Text`]. Rows and
//! bullets remember their original line and render it unchanged until they
//! are edited.

use regex::Regex;
use std::sync::LazyLock;

/// Heading that introduces the per-state sections.
pub const BY_STATE_HEADING: &str = "Documents by State";

/// Level of [`BY_STATE_HEADING`].
pub const BY_STATE_LEVEL: usize = 2;

/// Level of each per-state section heading.
pub const SECTION_LEVEL: usize = 3;

pub const TABLE_HEADER: &str = "| Number | Title | State | Updated |";
pub const TABLE_SEPARATOR: &str = "|--------|-------|-------|---------|";

static BULLET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-*]\s+\[(\d+)\s+-\s+(.*)\]\(([^)\s]+)\)\s*$").expect("valid bullet regex")
});

static HEADING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*?)(?:\s+#+)?\s*$").expect("valid heading regex"));

/// Data row of the index table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub number: u32,
    /// Number as displayed (zero-padded)
    pub label: String,
    pub title: String,
    pub state: String,
    pub updated: String,
    /// Cells beyond the four known columns, kept as-is
    pub extra: Vec<String>,
    raw: Option<String>,
}

impl IndexRow {
    pub fn new(
        number: u32,
        label: impl Into<String>,
        title: impl Into<String>,
        state: impl Into<String>,
        updated: impl Into<String>,
    ) -> Self {
        Self {
            number,
            label: label.into(),
            title: title.into(),
            state: state.into(),
            updated: updated.into(),
            extra: Vec::new(),
            raw: None,
        }
    }

    fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        let inner = trimmed.strip_prefix('|')?.strip_suffix('|')?;
        let cells: Vec<&str> = inner.split('|').map(str::trim).collect();
        if cells.len() < 4 {
            return None;
        }
        let label = cells[0];
        if label.is_empty() || !label.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            number: label.parse().ok()?,
            label: label.to_string(),
            title: cells[1].to_string(),
            state: cells[2].to_string(),
            updated: cells[3].to_string(),
            extra: cells[4..].iter().map(|c| c.to_string()).collect(),
            raw: Some(line.to_string()),
        })
    }

    /// Rewrite state and updated; returns whether anything changed.
    pub fn set_state(&mut self, state: &str, updated: &str) -> bool {
        if self.state == state && self.updated == updated {
            return false;
        }
        self.state = state.to_string();
        self.updated = updated.to_string();
        self.raw = None;
        true
    }

    pub fn render(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }
        let mut cells = vec![
            self.label.as_str(),
            self.title.as_str(),
            self.state.as_str(),
            self.updated.as_str(),
        ];
        cells.extend(self.extra.iter().map(String::as_str));
        format!("| {} |", cells.join(" | "))
    }
}

/// Bullet link in a per-state section: `- [0015 - Title](draft/0015-title.md)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionEntry {
    pub number: u32,
    pub label: String,
    pub title: String,
    /// Link target relative to the index directory
    pub target: String,
    raw: Option<String>,
}

impl SectionEntry {
    pub fn new(
        number: u32,
        label: impl Into<String>,
        title: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            number,
            label: label.into(),
            title: title.into(),
            target: target.into(),
            raw: None,
        }
    }

    fn parse(line: &str) -> Option<Self> {
        let caps = BULLET_PATTERN.captures(line.trim())?;
        let label = caps.get(1)?.as_str();
        Some(Self {
            number: label.parse().ok()?,
            label: label.to_string(),
            title: caps.get(2)?.as_str().trim().to_string(),
            target: caps.get(3)?.as_str().to_string(),
            raw: Some(line.to_string()),
        })
    }

    /// True when this bullet links to `target`.
    pub fn points_to(&self, target: &str) -> bool {
        normalize_link(&self.target) == normalize_link(target)
    }

    pub fn render(&self) -> String {
        if let Some(raw) = &self.raw {
            return raw.clone();
        }
        format!("- [{} - {}]({})", self.label, self.title, self.target)
    }
}

/// Canonical form of a link target for comparison.
pub fn normalize_link(target: &str) -> String {
    let target = target.replace('\\', "/");
    target.trim_start_matches("./").to_string()
}

/// One line of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Heading { level: usize, text: String },
    TableRow(IndexRow),
    Bullet(SectionEntry),
    Blank,
    Text(String),
}

impl Node {
    pub fn heading(level: usize, text: impl Into<String>) -> Self {
        Self::Heading {
            level,
            text: text.into(),
        }
    }

    fn parse(line: &str) -> Self {
        if line.trim().is_empty() {
            return Self::Blank;
        }
        if let Some(caps) = HEADING_PATTERN.captures(line) {
            let level = caps.get(1).map_or(1, |m| m.as_str().len());
            let text = caps.get(2).map_or("", |m| m.as_str());
            return Self::heading(level, text);
        }
        if let Some(row) = IndexRow::parse(line) {
            return Self::TableRow(row);
        }
        if let Some(entry) = SectionEntry::parse(line) {
            return Self::Bullet(entry);
        }
        Self::Text(line.to_string())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Self::Heading { .. })
    }

    /// Any list item, including bullets that are not index links.
    pub fn is_list_item(&self) -> bool {
        match self {
            Self::Bullet(_) => true,
            Self::Text(line) => {
                let line = line.trim_start();
                line.starts_with("- ") || line.starts_with("* ") || line.starts_with("+ ")
            }
            _ => false,
        }
    }

    /// Text line that is part of a pipe table (header or separator).
    pub fn is_table_line(&self) -> bool {
        match self {
            Self::TableRow(_) => true,
            Self::Text(line) => line.trim_start().starts_with('|'),
            _ => false,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Heading { level, text } => format!("{} {}", "#".repeat(*level), text),
            Self::TableRow(row) => row.render(),
            Self::Bullet(entry) => entry.render(),
            Self::Blank => String::new(),
            Self::Text(line) => line.clone(),
        }
    }
}

/// The aggregate index as an ordered list of nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexDocument {
    pub(crate) nodes: Vec<Node>,
}

impl IndexDocument {
    pub fn parse(text: &str) -> Self {
        Self {
            nodes: text
                .lines()
                .map(|l| Node::parse(l.trim_end_matches('\r')))
                .collect(),
        }
    }

    /// Empty index with a title, table header and the by-state heading.
    pub fn skeleton(title: &str) -> Self {
        Self {
            nodes: vec![
                Node::heading(1, title),
                Node::Blank,
                Node::Text(TABLE_HEADER.to_string()),
                Node::Text(TABLE_SEPARATOR.to_string()),
                Node::Blank,
                Node::heading(BY_STATE_LEVEL, BY_STATE_HEADING),
            ],
        }
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Serialize: one line per node, trailing blank lines dropped, single
    /// final newline.
    pub fn render(&self) -> String {
        let end = self
            .nodes
            .iter()
            .rposition(|n| !n.is_blank())
            .map_or(0, |i| i + 1);
        let mut out = String::new();
        for node in &self.nodes[..end] {
            out.push_str(&node.render());
            out.push('\n');
        }
        out
    }

    /// Table data rows in file order.
    pub fn rows(&self) -> impl Iterator<Item = &IndexRow> {
        self.nodes.iter().filter_map(|n| match n {
            Node::TableRow(row) => Some(row),
            _ => None,
        })
    }

    /// Section bullets in file order, across every section.
    pub fn entries(&self) -> impl Iterator<Item = &SectionEntry> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Bullet(entry) => Some(entry),
            _ => None,
        })
    }

    pub fn row(&self, number: u32) -> Option<&IndexRow> {
        self.rows().find(|r| r.number == number)
    }

    pub(crate) fn row_mut(&mut self, number: u32) -> Option<&mut IndexRow> {
        self.nodes.iter_mut().find_map(|n| match n {
            Node::TableRow(row) if row.number == number => Some(row),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# Specification Index\n\nIntro prose.\n\n| Number | Title | State | Updated |\n|--------|-------|-------|---------|\n| 0001 | First | Draft | 2026-01-01 |\n| 0002 | Second | Final | 2026-02-01 |\n\n## Documents by State\n\n### Draft\n\n- [0001 - First](draft/0001-first.md)\n\n### Final\n\n- [0002 - Second](final/0002-second.md)\n";

    #[test]
    fn test_parse_node_kinds() {
        let doc = IndexDocument::parse(SAMPLE);
        let nodes = doc.nodes();
        assert_eq!(nodes[0], Node::heading(1, "Specification Index"));
        assert!(nodes[1].is_blank());
        assert_eq!(nodes[2], Node::Text("Intro prose.".to_string()));
        assert!(matches!(nodes[4], Node::Text(_)));
        assert!(matches!(nodes[5], Node::Text(_)));
        assert!(matches!(nodes[6], Node::TableRow(_)));
        assert_eq!(doc.rows().count(), 2);
        assert!(nodes.iter().any(|n| matches!(n, Node::Bullet(e) if e.target == "final/0002-second.md")));
    }

    #[test]
    fn test_round_trip_is_lossless() {
        assert_eq!(IndexDocument::parse(SAMPLE).render(), SAMPLE);

        let aligned = "| 0007 |  Padded   | Draft | 2026-01-01 | extra |\n";
        assert_eq!(IndexDocument::parse(aligned).render(), aligned);
    }

    #[test]
    fn test_row_fields() {
        let doc = IndexDocument::parse(SAMPLE);
        let row = doc.row(2).unwrap();
        assert_eq!(row.label, "0002");
        assert_eq!(row.title, "Second");
        assert_eq!(row.state, "Final");
        assert_eq!(row.updated, "2026-02-01");
        assert!(doc.row(3).is_none());
    }

    #[test]
    fn test_edited_row_renders_canonically() {
        let mut doc = IndexDocument::parse("|  0001  |  First |  Draft | 2026-01-01 |\n");
        assert!(doc.row_mut(1).unwrap().set_state("Final", "2026-10-16"));
        assert_eq!(doc.render(), "| 0001 | First | Final | 2026-10-16 |\n");
        assert!(!doc.row_mut(1).unwrap().set_state("Final", "2026-10-16"));
    }

    #[test]
    fn test_bullet_parse_and_render() {
        let entry = SectionEntry::parse("- [0015 - Index: Sync [v2]](under-review/0015-index.md)").unwrap();
        assert_eq!(entry.number, 15);
        assert_eq!(entry.title, "Index: Sync [v2]");
        assert_eq!(entry.target, "under-review/0015-index.md");
        assert!(entry.points_to("./under-review/0015-index.md"));

        let fresh = SectionEntry::new(3, "0003", "Third", "draft/0003-third.md");
        assert_eq!(fresh.render(), "- [0003 - Third](draft/0003-third.md)");
    }

    #[test]
    fn test_list_item_detection() {
        assert!(Node::parse("- plain item").is_list_item());
        assert!(Node::parse("- [0001 - A](a.md)").is_list_item());
        assert!(!Node::parse("plain").is_list_item());
        assert!(!Node::parse("").is_list_item());
    }

    #[test]
    fn test_heading_keeps_trailing_hash_in_text() {
        assert_eq!(Node::parse("### C#"), Node::heading(3, "C#"));
        assert_eq!(Node::parse("## Notes ##"), Node::heading(2, "Notes"));
        assert!(matches!(Node::parse("#hashtag"), Node::Text(_)));

        let text = "## Documents by State\n\n### C#\n";
        assert_eq!(IndexDocument::parse(text).render(), text);
    }

    #[test]
    fn test_render_drops_trailing_blanks() {
        let doc = IndexDocument::parse("# T\n\n\n");
        assert_eq!(doc.render(), "# T\n");
    }

    #[test]
    fn test_crlf_input_parses() {
        let doc = IndexDocument::parse("# T\r\n\r\n| 0001 | A | Draft | 2026-01-01 |\r\n");
        assert_eq!(doc.rows().count(), 1);
        assert_eq!(doc.nodes()[0], Node::heading(1, "T"));
    }
}
