//! Task ledger domain model.
//!
//! The ledger is a sectioned markdown checklist owned by the environment, not
//! by this process. Entries are identified purely by document position; they
//! are never reordered or deleted, only flipped pending -> done or appended.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// Status of a single checklist entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Done,
}

/// Work category parsed from the optional `[tag]` prefix of an entry.
///
/// The set is closed; anything unrecognized falls back to `Other` carrying
/// the raw tag so rendering preserves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Bug,
    Feature,
    Refactor,
    Test,
    Docs,
    Perf,
    Other(String),
}

impl Category {
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "bug" | "fix" => Self::Bug,
            "feature" | "feat" => Self::Feature,
            "refactor" => Self::Refactor,
            "test" | "tests" => Self::Test,
            "docs" | "doc" => Self::Docs,
            "perf" => Self::Perf,
            _ => Self::Other(tag.trim().to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::Refactor => "refactor",
            Self::Test => "test",
            Self::Docs => "docs",
            Self::Perf => "perf",
            Self::Other(raw) => raw,
        }
    }
}

/// One checklist line: status, optional category, description, optional
/// trailing `(source)` annotation, and indented sub-notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub status: EntryStatus,
    pub category: Option<Category>,
    pub description: String,
    pub source: Option<String>,
    pub notes: Vec<String>,
}

impl Entry {
    pub fn pending(description: impl Into<String>) -> Self {
        Self {
            status: EntryStatus::Pending,
            category: None,
            description: description.into(),
            source: None,
            notes: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == EntryStatus::Pending
    }

    /// Parse a trimmed checkbox line, without its leading indentation.
    /// Returns `None` for anything that is not a checkbox entry.
    fn parse_line(line: &str) -> Option<Self> {
        let status;
        let rest;
        if let Some(r) = line.strip_prefix("- [ ]") {
            status = EntryStatus::Pending;
            rest = r;
        } else if let Some(r) = line.strip_prefix("- [x]").or_else(|| line.strip_prefix("- [X]")) {
            status = EntryStatus::Done;
            rest = r;
        } else {
            return None;
        }

        let mut text = rest.trim();

        let mut category = None;
        if let Some(after) = text.strip_prefix('[') {
            if let Some(end) = after.find(']') {
                category = Some(Category::parse(&after[..end]));
                text = after[end + 1..].trim_start();
            }
        }

        let mut source = None;
        if text.ends_with(')') {
            if let Some(open) = text.rfind('(') {
                let inner = &text[open + 1..text.len() - 1];
                if !inner.is_empty() {
                    source = Some(inner.to_string());
                    text = text[..open].trim_end();
                }
            }
        }

        Some(Self {
            status,
            category,
            description: text.to_string(),
            source,
            notes: Vec::new(),
        })
    }

    fn render(&self, out: &mut String) {
        match self.status {
            EntryStatus::Pending => out.push_str("- [ ] "),
            EntryStatus::Done => out.push_str("- [x] "),
        }
        if let Some(category) = &self.category {
            out.push('[');
            out.push_str(category.as_tag());
            out.push_str("] ");
        }
        out.push_str(&self.description);
        if let Some(source) = &self.source {
            out.push_str(" (");
            out.push_str(source);
            out.push(')');
        }
        out.push('\n');
        for note in &self.notes {
            out.push_str("  - ");
            out.push_str(note);
            out.push('\n');
        }
    }
}

/// A named group of entries. Blocking sections must be fully drained before
/// any non-blocking section's entries become eligible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub blocking: bool,
    pub entries: Vec<Entry>,
}

impl Section {
    pub fn new(title: impl Into<String>, blocking: bool) -> Self {
        Self {
            title: title.into(),
            blocking,
            entries: Vec::new(),
        }
    }
}

/// Positional identity of an entry: indices into the section list and the
/// section's entry list. Stable within one parse of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryId {
    pub section: usize,
    pub entry: usize,
}

/// The full checklist document: optional title plus ordered sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub title: Option<String>,
    pub sections: Vec<Section>,
}

impl Ledger {
    /// Parse a markdown checklist. Headings delimit sections; a heading whose
    /// title matches one of `blocking_headings` (case-insensitive) marks that
    /// section as blocking. Fails when the document contains no checkbox
    /// markers at all.
    pub fn parse(doc: &str, blocking_headings: &[String]) -> DomainResult<Self> {
        let mut ledger = Self {
            title: None,
            sections: Vec::new(),
        };
        let mut saw_marker = false;

        for line in doc.lines() {
            if let Some(stripped) = line.strip_prefix('#') {
                let level = 1 + stripped.chars().take_while(|c| *c == '#').count();
                let title = stripped.trim_start_matches('#').trim();
                if level == 1 && ledger.title.is_none() && ledger.sections.is_empty() {
                    ledger.title = Some(title.to_string());
                    continue;
                }
                let blocking = blocking_headings
                    .iter()
                    .any(|h| h.eq_ignore_ascii_case(title));
                ledger.sections.push(Section::new(title, blocking));
            } else if let Some(entry) = Entry::parse_line(line.trim_start()) {
                saw_marker = true;
                if ledger.sections.is_empty() {
                    ledger.sections.push(Section::new("Tasks", false));
                }
                if let Some(section) = ledger.sections.last_mut() {
                    section.entries.push(entry);
                }
            } else if let Some(note) = note_line(line) {
                if let Some(entry) = ledger
                    .sections
                    .last_mut()
                    .and_then(|s| s.entries.last_mut())
                {
                    entry.notes.push(note.to_string());
                }
            }
        }

        if !saw_marker {
            return Err(DomainError::LedgerParse(
                "no checklist markers found in ledger document".into(),
            ));
        }
        Ok(ledger)
    }

    /// Canonical checklist serialization: title, headings, checkbox lines and
    /// sub-notes. Free prose from the source document is not preserved.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(title) = &self.title {
            out.push_str("# ");
            out.push_str(title);
            out.push_str("\n\n");
        }
        for section in &self.sections {
            if !section.title.is_empty() {
                out.push_str("## ");
                out.push_str(&section.title);
                out.push('\n');
            }
            for entry in &section.entries {
                entry.render(&mut out);
            }
            out.push('\n');
        }
        out
    }

    /// The single current task: the first pending entry scanning blocking
    /// sections in document order, then non-blocking sections in document
    /// order. Precedence holds even when sections are interleaved out of
    /// order in the raw document.
    pub fn find_first_pending(&self) -> Option<(EntryId, &Entry)> {
        let passes = [true, false];
        for blocking in passes {
            for (section_idx, section) in self.sections.iter().enumerate() {
                if section.blocking != blocking {
                    continue;
                }
                for (entry_idx, entry) in section.entries.iter().enumerate() {
                    if entry.is_pending() {
                        return Some((
                            EntryId {
                                section: section_idx,
                                entry: entry_idx,
                            },
                            entry,
                        ));
                    }
                }
            }
        }
        None
    }

    /// Flip an entry to done. Idempotent: marking a done entry again (or an
    /// id that no longer resolves) is a no-op and returns `false`.
    pub fn mark_done(&mut self, id: EntryId) -> bool {
        let Some(entry) = self
            .sections
            .get_mut(id.section)
            .and_then(|s| s.entries.get_mut(id.entry))
        else {
            return false;
        };
        if entry.status == EntryStatus::Done {
            return false;
        }
        entry.status = EntryStatus::Done;
        true
    }

    /// Append new entries to the first blocking section (first section when
    /// none is blocking; a synthetic blocking section when the ledger has no
    /// sections at all). Entries whose trimmed description duplicates an
    /// existing entry in the target section are skipped. Returns the number
    /// inserted.
    pub fn insert_new(&mut self, entries: Vec<Entry>) -> usize {
        let target = match self.sections.iter().position(|s| s.blocking) {
            Some(idx) => idx,
            None => {
                if self.sections.is_empty() {
                    self.sections.push(Section::new("Blocking", true));
                }
                0
            }
        };
        let section = &mut self.sections[target];

        let mut inserted = 0;
        for mut entry in entries {
            let duplicate = section
                .entries
                .iter()
                .any(|e| descriptions_match(&e.description, &entry.description));
            if duplicate {
                continue;
            }
            entry.status = EntryStatus::Pending;
            section.entries.push(entry);
            inserted += 1;
        }
        inserted
    }

    /// (completed, remaining) entry counts across all sections.
    pub fn counts(&self) -> (usize, usize) {
        let mut completed = 0;
        let mut remaining = 0;
        for section in &self.sections {
            for entry in &section.entries {
                match entry.status {
                    EntryStatus::Done => completed += 1,
                    EntryStatus::Pending => remaining += 1,
                }
            }
        }
        (completed, remaining)
    }
}

fn descriptions_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// An indented `- ` bullet under an entry, which is not itself a checkbox.
fn note_line(line: &str) -> Option<&str> {
    let without_indent = line.strip_prefix("  ")?;
    let rest = without_indent.trim_start();
    if rest.starts_with("- [") {
        return None;
    }
    rest.strip_prefix("- ").map(str::trim)
}
