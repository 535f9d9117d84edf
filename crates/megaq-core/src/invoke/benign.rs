//! Benign stderr classification.
//!
//! megadl exits non-zero when a file is already on disk, which for a batch
//! resume is a success. The classifier scans the captured stderr line by
//! line: the attempt is only "benign" when every non-blank line matches a
//! known already-downloaded prefix. A single unrecognized line vetoes the
//! whole buffer, because a real failure can sit interleaved with a benign
//! diagnostic.

use crate::config::LINK_PLACEHOLDER;
use crate::link::Link;

/// Set of stderr line prefixes that signal "already downloaded".
/// The prefixes are data (from config), not code; `{link}` expands to the
/// link of the current attempt.
#[derive(Debug, Clone)]
pub struct BenignPatterns {
    prefixes: Vec<String>,
}

impl BenignPatterns {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    fn line_is_benign(&self, line: &str, link: &Link) -> bool {
        self.prefixes.iter().any(|prefix| {
            if prefix.contains(LINK_PLACEHOLDER) {
                let expanded = prefix.replace(LINK_PLACEHOLDER, link.as_str());
                line.starts_with(&expanded)
            } else {
                line.starts_with(prefix.as_str())
            }
        })
    }

    /// True iff every non-blank trimmed line of `stderr` is benign.
    /// Vacuously true for an empty buffer.
    pub fn all_benign(&self, stderr: &str, link: &Link) -> bool {
        stderr
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .all(|line| self.line_is_benign(line, link))
    }
}
