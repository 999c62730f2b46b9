//! Metadata envelope codec.
//!
//! An envelope is the `---` delimited block of `key: value` lines at the very
//! top of a document:
//!
//! ```text
//! ---
//! number: 0015
//! title: Index Synchronization
//! author: Jane Doe
//! created: 2026-01-04
//! updated: 2026-02-11
//! state: Draft
//! supersedes: none
//! superseded-by: none
//! ---
//! ```
//!
//! Parsing keeps every line verbatim (line endings included) so rendering an
//! envelope that was only partially edited leaves all untouched bytes intact.

use chrono::NaiveDate;
use thiserror::Error;

/// Opening and closing marker line.
pub const MARKER: &str = "---";

/// Keys every complete envelope carries, in canonical order.
pub const REQUIRED_KEYS: [&str; 8] = [
    "number",
    "title",
    "author",
    "created",
    "updated",
    "state",
    "supersedes",
    "superseded-by",
];

/// Date format used by `created` / `updated`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Placeholder for an absent cross-reference.
pub const NONE_VALUE: &str = "none";

/// Codec-level errors; the caller attaches the path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("no '---' metadata block at the top of the file")]
    Missing,

    #[error("metadata block is never closed by a '---' line")]
    Unterminated,

    #[error("field '{key}' has an invalid value '{value}'")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EnvelopeLine {
    raw: String,
    field: Option<(String, String)>,
}

impl EnvelopeLine {
    fn parse(raw: &str) -> Self {
        let field = raw.trim_end().split_once(':').and_then(|(key, value)| {
            let key = key.trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                None
            } else {
                Some((key.to_string(), value.trim().to_string()))
            }
        });
        Self {
            raw: raw.to_string(),
            field,
        }
    }

    fn key(&self) -> Option<&str> {
        self.field.as_ref().map(|(k, _)| k.as_str())
    }
}

/// Parsed envelope plus the untouched document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    opening: String,
    lines: Vec<EnvelopeLine>,
    closing: String,
    body: String,
}

/// Values inferred for a document that lacks some envelope fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredFacts {
    /// Zero-padded number
    pub number: String,
    pub author: String,
    pub created: NaiveDate,
    pub updated: NaiveDate,
    /// Canonical display name
    pub state: String,
}

fn line_ending(raw: &str) -> &'static str {
    if raw.ends_with("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

impl Envelope {
    /// Parse the envelope at the top of `content`.
    pub fn parse(content: &str) -> Result<Self, EnvelopeError> {
        let mut raw_lines = content.split_inclusive('\n');
        let first = raw_lines.next().ok_or(EnvelopeError::Missing)?;
        if first.trim_start_matches('\u{feff}').trim_end() != MARKER {
            return Err(EnvelopeError::Missing);
        }

        let mut consumed = first.len();
        let mut lines = Vec::new();
        for raw in raw_lines {
            consumed += raw.len();
            if raw.trim_end() == MARKER {
                return Ok(Self {
                    opening: first.to_string(),
                    lines,
                    closing: raw.to_string(),
                    body: content[consumed..].to_string(),
                });
            }
            lines.push(EnvelopeLine::parse(raw));
        }

        Err(EnvelopeError::Unterminated)
    }

    /// Cheap presence check.
    pub fn has_envelope(content: &str) -> bool {
        Self::parse(content).is_ok()
    }

    /// Value of `key`, if the envelope has that line.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .filter_map(|l| l.field.as_ref())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of `key` when present and non-empty.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// All fields in file order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines
            .iter()
            .filter_map(|l| l.field.as_ref())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn state(&self) -> Option<&str> {
        self.get_non_empty("state")
    }

    pub fn title(&self) -> Option<&str> {
        self.get_non_empty("title")
    }

    pub fn updated(&self) -> Option<&str> {
        self.get_non_empty("updated")
    }

    /// Numeric value of the `number` field.
    pub fn number(&self) -> Result<u32, EnvelopeError> {
        let raw = self.get("number").unwrap_or_default();
        raw.parse::<u32>().map_err(|_| EnvelopeError::InvalidValue {
            key: "number".to_string(),
            value: raw.to_string(),
        })
    }

    /// Document body following the closing marker.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Rewrite `key` in place, or append it before the closing marker.
    pub fn set(&mut self, key: &str, value: &str) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.key() == Some(key)) {
            let eol = line_ending(&line.raw);
            line.raw = format!("{key}: {value}{eol}");
            line.field = Some((key.to_string(), value.to_string()));
            return;
        }
        let eol = line_ending(&self.opening);
        self.lines.push(EnvelopeLine {
            raw: format!("{key}: {value}{eol}"),
            field: Some((key.to_string(), value.to_string())),
        });
    }

    /// Serialize back to text.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.body.len() + 256);
        out.push_str(&self.opening);
        for line in &self.lines {
            out.push_str(&line.raw);
        }
        out.push_str(&self.closing);
        out.push_str(&self.body);
        out
    }

    /// Rewrite only the `state` and `updated` lines.
    pub fn update(content: &str, new_state: &str, today: NaiveDate) -> Result<String, EnvelopeError> {
        let mut envelope = Self::parse(content)?;
        envelope.set("state", new_state);
        envelope.set("updated", &today.format(DATE_FORMAT).to_string());
        Ok(envelope.render())
    }

    /// Build a complete envelope for `content`.
    ///
    /// An existing envelope is repaired in place: non-empty values win and
    /// only missing or empty fields are filled from `facts`. Without an
    /// envelope a fresh one is prepended to the content.
    pub fn synthesize(file_name: &str, content: &str, facts: &InferredFacts) -> String {
        match Self::parse(content) {
            Ok(mut envelope) => {
                let title = infer_title(file_name, envelope.body());
                for key in REQUIRED_KEYS {
                    if envelope.get_non_empty(key).is_none() {
                        envelope.set(key, &inferred_value(key, &title, facts));
                    }
                }
                envelope.render()
            }
            Err(_) => {
                let title = infer_title(file_name, content);
                let mut out = String::from(MARKER);
                out.push('\n');
                for key in REQUIRED_KEYS {
                    out.push_str(&format!("{key}: {}\n", inferred_value(key, &title, facts)));
                }
                out.push_str(MARKER);
                out.push('\n');
                if !content.is_empty() && !content.starts_with('\n') {
                    out.push('\n');
                }
                out.push_str(content);
                out
            }
        }
    }
}

fn inferred_value(key: &str, title: &str, facts: &InferredFacts) -> String {
    match key {
        "number" => facts.number.clone(),
        "title" => title.to_string(),
        "author" => facts.author.clone(),
        "created" => facts.created.format(DATE_FORMAT).to_string(),
        "updated" => facts.updated.format(DATE_FORMAT).to_string(),
        "state" => facts.state.clone(),
        _ => NONE_VALUE.to_string(),
    }
}

/// Title from the first `# ` heading, falling back to the file name.
pub fn infer_title(file_name: &str, body: &str) -> String {
    if let Some(heading) = body
        .lines()
        .map(str::trim)
        .find_map(|l| l.strip_prefix("# "))
        .map(str::trim)
        .filter(|h| !h.is_empty())
    {
        return heading.to_string();
    }

    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);
    let stem = stem.trim_start_matches(|c: char| c.is_ascii_digit() || c == '-' || c == '_');
    let words: Vec<String> = stem
        .split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        "Untitled".to_string()
    } else {
        words.join(" ")
    }
}
