//! Link List File model.
//!
//! One entry per line, status encoded as a prefix: raw link = pending,
//! `#link` = completed, `#-link` = rejected (invalid). Entries are only ever
//! re-prefixed, never deleted, so an interrupted run resumes where it left
//! off. Blank lines are dropped on load and never re-emitted.

mod persist;

use std::path::{Path, PathBuf};

const COMPLETED_PREFIX: &str = "#";
const REJECTED_PREFIX: &str = "#-";

/// Processing state of one list entry. `Completed` and `Rejected` are
/// terminal; later runs skip them unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    Completed,
    Rejected,
}

/// One line of a list file: the entry text plus its status prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    state: EntryState,
    text: String,
}

impl Entry {
    /// Decode a trimmed, non-empty line. `#-` must be tested before `#`.
    pub fn parse(line: &str) -> Entry {
        if let Some(text) = line.strip_prefix(REJECTED_PREFIX) {
            Entry {
                state: EntryState::Rejected,
                text: text.to_string(),
            }
        } else if let Some(text) = line.strip_prefix(COMPLETED_PREFIX) {
            Entry {
                state: EntryState::Completed,
                text: text.to_string(),
            }
        } else {
            Entry {
                state: EntryState::Pending,
                text: line.to_string(),
            }
        }
    }

    /// Encode back into the on-disk line form.
    pub fn to_line(&self) -> String {
        match self.state {
            EntryState::Pending => self.text.clone(),
            EntryState::Completed => format!("{COMPLETED_PREFIX}{}", self.text),
            EntryState::Rejected => format!("{REJECTED_PREFIX}{}", self.text),
        }
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    /// Entry text without the status prefix.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// In-memory image of one list file. Loaded once per run; saved after every
/// single-entry state change so progress survives interruption.
#[derive(Debug)]
pub struct LinkList {
    path: PathBuf,
    entries: Vec<Entry>,
}

impl LinkList {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> &Entry {
        &self.entries[index]
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Terminal transition: the link was downloaded (or recognized as
    /// already downloaded).
    pub fn mark_completed(&mut self, index: usize) {
        self.entries[index].state = EntryState::Completed;
    }

    /// Terminal transition: the entry is not a valid link and is never
    /// retried or re-validated.
    pub fn mark_rejected(&mut self, index: usize) {
        self.entries[index].state = EntryState::Rejected;
    }
}
