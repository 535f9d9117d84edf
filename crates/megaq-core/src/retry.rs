//! Unbounded per-link retry loop.
//!
//! The loop never gives up on its own: a permanently broken link retries
//! forever and the operator decides when to stop. Tests and embedders bound
//! it through a `CancelToken` instead of killing the process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::invoke::{Attempt, Downloader};
use crate::link::Link;

/// Shared cancel flag; clone freely and set from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How a retry loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// The downloader reported success for the link.
    Completed,
    /// The token was cancelled before a success was observed.
    Cancelled,
}

/// Wait-and-retry control structure applied per link.
#[derive(Debug, Clone)]
pub struct RetryLoop {
    interval: Duration,
    cancel: CancelToken,
}

/// Granularity of the cancellable sleep.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

impl RetryLoop {
    pub fn new(interval: Duration, cancel: CancelToken) -> Self {
        Self { interval, cancel }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Invoke the downloader for `link` until it succeeds or the token is
    /// cancelled. Failed attempts wait out the configured interval first.
    pub fn run<D: Downloader>(&self, downloader: &mut D, link: &Link) -> RetryOutcome {
        loop {
            if self.cancel.is_cancelled() {
                return RetryOutcome::Cancelled;
            }
            match downloader.fetch(link) {
                Ok(Attempt::Success) => {
                    tracing::info!(link = %link, "download done");
                    return RetryOutcome::Completed;
                }
                Ok(Attempt::Failure) => {
                    tracing::warn!(
                        link = %link,
                        wait = ?self.interval,
                        "download failed, retrying after interval"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        link = %link,
                        wait = ?self.interval,
                        error = %e,
                        "downloader did not run, retrying after interval"
                    );
                }
            }
            if !self.sleep_interval() {
                return RetryOutcome::Cancelled;
            }
        }
    }

    /// Sleep the retry interval in slices, watching the token. Returns false
    /// when cancelled mid-wait.
    fn sleep_interval(&self) -> bool {
        let mut remaining = self.interval;
        while remaining > Duration::ZERO {
            if self.cancel.is_cancelled() {
                return false;
            }
            let step = remaining.min(SLEEP_SLICE);
            std::thread::sleep(step);
            remaining -= step;
        }
        !self.cancel.is_cancelled()
    }
}
