//! CLI for the megaq batch downloader.

use anyhow::Result;
use clap::Parser;
use megaq_core::config;
use megaq_core::invoke::MegadlCommand;
use megaq_core::processor::Processor;
use megaq_core::retry::{CancelToken, RetryLoop};

/// megaq: retrying batch front-end for megadl.
///
/// Each argument is either a mega.nz link (downloaded directly) or a path to
/// a link list file. List files record progress in place: `#link` lines are
/// done, `#-link` lines were rejected as invalid, raw lines are pending.
#[derive(Debug, Parser)]
#[command(name = "megaq")]
#[command(about = "megaq: retrying batch front-end for megadl", long_about = None)]
pub struct Cli {
    /// mega.nz links or paths to link list files, processed in order.
    #[arg(required = true, value_name = "LINK_OR_FILE")]
    pub sources: Vec<String>,

    /// Speed limit passed to the downloader as --limit-speed=<N> (0 = unlimited).
    #[arg(short = 'l', long = "limit-speed", value_name = "BYTES_PER_SEC")]
    pub limit_speed: Option<u64>,

    /// Seconds to wait between retries of a failed link.
    #[arg(short = 'r', long = "retry-interval", value_name = "SECS")]
    pub retry_interval: Option<u64>,

    /// Mirror the downloader's own stdout/stderr to the terminal.
    #[arg(short = 'p', long = "pipe")]
    pub pipe: bool,
}

impl Cli {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;

        // Flags override the config file for this run.
        if let Some(limit) = cli.limit_speed {
            cfg.speed_limit = limit;
        }
        if let Some(secs) = cli.retry_interval {
            cfg.retry_interval_secs = secs;
        }
        if cli.pipe {
            cfg.pipe_output = true;
        }
        tracing::debug!("effective config: {:?}", cfg);

        let downloader = MegadlCommand::new(&cfg);
        let retry = RetryLoop::new(cfg.retry_interval(), CancelToken::new());
        let mut processor = Processor::new(downloader, retry);
        let summary = processor.run(&cli.sources);

        println!(
            "All download(s) done: {} completed, {} rejected, {} skipped, {} unreadable file(s).",
            summary.completed, summary.rejected, summary.skipped, summary.unreadable
        );
        Ok(())
    }
}
