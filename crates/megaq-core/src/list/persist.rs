//! Load and save the list file. Saves are atomic (temp file + rename) so an
//! interrupt mid-write can never truncate recorded progress.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use super::{Entry, LinkList};

impl LinkList {
    /// Read a list file into memory: split into lines, trim whitespace, drop
    /// blanks. Line numbers are not stable across rewrites because of the
    /// blank-line drop.
    pub fn load(path: &Path) -> Result<LinkList> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("read list file: {}", path.display()))?;
        let entries = data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Entry::parse)
            .collect();
        Ok(LinkList {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Rewrite the whole file from the in-memory entries, joined with `\n`.
    /// The temp file lives in the same directory so the final rename stays on
    /// one filesystem.
    pub fn save(&self) -> Result<()> {
        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let dir = dir.unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("create temp file in {}", dir.display()))?;

        let lines: Vec<String> = self.entries.iter().map(Entry::to_line).collect();
        tmp.write_all(lines.join("\n").as_bytes())
            .with_context(|| format!("write list file: {}", self.path.display()))?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("sync list file: {}", self.path.display()))?;

        tmp.persist(&self.path)
            .with_context(|| format!("replace list file: {}", self.path.display()))?;
        Ok(())
    }
}
