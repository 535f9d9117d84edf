//! Sequential link batch processing with file-backed progress.
//!
//! One link is processed fully (including all retries) before the next
//! begins. Every single-entry state change rewrites the backing file, so an
//! interrupted run loses at most the in-flight entry's final state.

use std::path::Path;

use crate::invoke::Downloader;
use crate::link::Link;
use crate::list::{EntryState, LinkList};
use crate::retry::{RetryLoop, RetryOutcome};

/// Counters for the final summary line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Links downloaded (or recognized as already downloaded) this run.
    pub completed: u64,
    /// Entries rejected as invalid this run.
    pub rejected: u64,
    /// Entries already terminal from a previous run.
    pub skipped: u64,
    /// List files that could not be read.
    pub unreadable: u64,
}

/// Whether the batch keeps going after a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Drives the whole batch: source dispatch, the per-file entry state
/// machine, and persistence after every transition.
#[derive(Debug)]
pub struct Processor<D: Downloader> {
    downloader: D,
    retry: RetryLoop,
}

impl<D: Downloader> Processor<D> {
    pub fn new(downloader: D, retry: RetryLoop) -> Self {
        Self { downloader, retry }
    }

    /// Process every source in order. Stops early only on cancellation.
    pub fn run(&mut self, sources: &[String]) -> RunSummary {
        let mut summary = RunSummary::default();
        for arg in sources {
            if self.process_source(arg, &mut summary) == Flow::Stop {
                break;
            }
        }
        summary
    }

    /// A valid link is downloaded directly (nothing to persist); anything
    /// else is treated as a list-file path.
    fn process_source(&mut self, arg: &str, summary: &mut RunSummary) -> Flow {
        match Link::parse(arg) {
            Some(link) => match self.retry.run(&mut self.downloader, &link) {
                RetryOutcome::Completed => {
                    summary.completed += 1;
                    Flow::Continue
                }
                RetryOutcome::Cancelled => Flow::Stop,
            },
            None => self.process_file(Path::new(arg), summary),
        }
    }

    fn process_file(&mut self, path: &Path, summary: &mut RunSummary) -> Flow {
        let mut list = match LinkList::load(path) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = format!("{e:#}"),
                    "cannot read list file, skipping"
                );
                summary.unreadable += 1;
                return Flow::Continue;
            }
        };

        for i in 0..list.len() {
            let entry = list.entry(i);
            match entry.state() {
                EntryState::Completed | EntryState::Rejected => {
                    tracing::debug!(entry = %entry.text(), "skipping, already processed");
                    summary.skipped += 1;
                }
                EntryState::Pending => match Link::parse(entry.text()) {
                    None => {
                        tracing::warn!(entry = %entry.text(), "invalid link, rejecting");
                        list.mark_rejected(i);
                        persist(&list);
                        summary.rejected += 1;
                    }
                    Some(link) => match self.retry.run(&mut self.downloader, &link) {
                        RetryOutcome::Completed => {
                            list.mark_completed(i);
                            persist(&list);
                            summary.completed += 1;
                        }
                        // Leave the entry pending; a rerun resumes here.
                        RetryOutcome::Cancelled => return Flow::Stop,
                    },
                },
            }
        }
        Flow::Continue
    }
}

/// A failed save is a warning, not a stop: the state is simply not persisted
/// until the next successful rewrite.
fn persist(list: &LinkList) {
    if let Err(e) = list.save() {
        tracing::warn!(
            path = %list.path().display(),
            error = format!("{e:#}"),
            "cannot write list file, progress not persisted"
        );
    }
}
