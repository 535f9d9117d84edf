//! External downloader invocation.
//!
//! One attempt = one `megadl --limit-speed=<N> <link>` process, fully owned
//! and awaited; stderr is always captured for benign-failure classification.

mod benign;

pub use benign::BenignPatterns;

use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{ChildStderr, Command, Stdio};
use thiserror::Error;

use crate::config::MegaqConfig;
use crate::link::Link;

/// Result of one downloader attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Zero exit, or non-zero exit with only benign diagnostics on stderr.
    Success,
    /// Non-zero exit with at least one unrecognized stderr line.
    Failure,
}

/// The downloader process could not be run at all (spawn or wait failed).
/// Distinct from `Attempt::Failure`: an absent binary must not be mistaken
/// for an empty (vacuously benign) stderr.
#[derive(Debug, Error)]
#[error("could not run {program}: {source}")]
pub struct InvokeError {
    program: String,
    #[source]
    source: std::io::Error,
}

/// Seam for the external downloader so the retry loop and processor can be
/// tested with scripted stubs.
pub trait Downloader {
    fn fetch(&mut self, link: &Link) -> Result<Attempt, InvokeError>;
}

/// Real collaborator: spawns the configured program once per attempt.
#[derive(Debug)]
pub struct MegadlCommand {
    program: PathBuf,
    speed_limit: u64,
    pipe_output: bool,
    benign: BenignPatterns,
}

impl MegadlCommand {
    pub fn new(cfg: &MegaqConfig) -> Self {
        Self {
            program: PathBuf::from(&cfg.downloader_program),
            speed_limit: cfg.speed_limit,
            pipe_output: cfg.pipe_output,
            benign: BenignPatterns::new(cfg.benign_prefixes.clone()),
        }
    }

    fn invoke_error(&self, source: io::Error) -> InvokeError {
        InvokeError {
            program: self.program.display().to_string(),
            source,
        }
    }

    /// Drain the child's stderr into a string. In pipe mode every line is
    /// mirrored to our own stderr as it arrives, so the operator sees megadl
    /// live while the buffer stays available for classification.
    fn read_stderr(&self, pipe: ChildStderr) -> io::Result<String> {
        let mut reader = BufReader::new(pipe);
        if !self.pipe_output {
            let mut raw = Vec::new();
            reader.read_to_end(&mut raw)?;
            return Ok(String::from_utf8_lossy(&raw).into_owned());
        }

        let mut buffered = String::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            let mut err = io::stderr().lock();
            let _ = err.write_all(&line);
            buffered.push_str(&String::from_utf8_lossy(&line));
        }
        Ok(buffered)
    }
}

impl Downloader for MegadlCommand {
    fn fetch(&mut self, link: &Link) -> Result<Attempt, InvokeError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(format!("--limit-speed={}", self.speed_limit))
            .arg(link.as_str())
            .stdin(Stdio::null())
            .stderr(Stdio::piped());
        if self.pipe_output {
            cmd.stdout(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::null());
        }

        tracing::debug!(program = %self.program.display(), link = %link, "invoking downloader");
        let mut child = cmd.spawn().map_err(|source| self.invoke_error(source))?;
        // stderr must be drained to EOF before waiting; stdout is never
        // piped, so this cannot deadlock.
        let stderr = match child.stderr.take() {
            Some(pipe) => self
                .read_stderr(pipe)
                .map_err(|source| self.invoke_error(source))?,
            None => String::new(),
        };
        let status = child.wait().map_err(|source| self.invoke_error(source))?;

        if status.success() {
            return Ok(Attempt::Success);
        }
        if self.benign.all_benign(&stderr, link) {
            tracing::debug!(link = %link, "non-zero exit but all diagnostics benign");
            Ok(Attempt::Success)
        } else {
            Ok(Attempt::Failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    fn link() -> Link {
        Link::parse("mega.nz/#abc").unwrap()
    }

    /// Write an executable shell script standing in for megadl.
    #[cfg(unix)]
    fn stub_script(body: &str) -> tempfile::TempPath {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "#!/bin/sh\n{body}").unwrap();
        f.flush().unwrap();
        let path = f.into_temp_path();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[cfg(unix)]
    fn command_for(script: &std::path::Path) -> MegadlCommand {
        let mut cfg = MegaqConfig::default();
        cfg.downloader_program = script.display().to_string();
        MegadlCommand::new(&cfg)
    }

    #[cfg(unix)]
    #[test]
    fn zero_exit_is_success() {
        let script = stub_script("exit 0");
        let mut dl = command_for(&script);
        assert_eq!(dl.fetch(&link()).unwrap(), Attempt::Success);
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_with_benign_stderr_is_success() {
        let script =
            stub_script("echo 'ERROR: File already exists at /tmp/x' >&2\nexit 1");
        let mut dl = command_for(&script);
        assert_eq!(dl.fetch(&link()).unwrap(), Attempt::Success);
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_with_mixed_stderr_is_failure() {
        let script = stub_script(
            "echo 'ERROR: File already exists at /tmp/x' >&2\n\
             echo 'ERROR: quota exceeded' >&2\n\
             exit 1",
        );
        let mut dl = command_for(&script);
        assert_eq!(dl.fetch(&link()).unwrap(), Attempt::Failure);
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_with_plain_error_is_failure() {
        let script = stub_script("echo 'ERROR: no such node' >&2\nexit 2");
        let mut dl = command_for(&script);
        assert_eq!(dl.fetch(&link()).unwrap(), Attempt::Failure);
    }

    #[cfg(unix)]
    #[test]
    fn speed_limit_and_link_are_passed_through() {
        // The stub checks its own argv and fails if they differ.
        let script = stub_script(
            "[ \"$1\" = '--limit-speed=1024' ] || exit 9\n\
             [ \"$2\" = 'mega.nz/#abc' ] || exit 9\n\
             exit 0",
        );
        let mut cfg = MegaqConfig::default();
        cfg.downloader_program = script.display().to_string();
        cfg.speed_limit = 1024;
        let mut dl = MegadlCommand::new(&cfg);
        assert_eq!(dl.fetch(&link()).unwrap(), Attempt::Success);
    }

    #[cfg(unix)]
    #[test]
    fn pipe_mode_still_classifies_benign_stderr() {
        // The line-streaming stderr reader must feed the classifier the same
        // buffer the quiet path gets.
        let script =
            stub_script("echo 'ERROR: File already exists at /tmp/x' >&2\nexit 1");
        let mut cfg = MegaqConfig::default();
        cfg.downloader_program = script.display().to_string();
        cfg.pipe_output = true;
        let mut dl = MegadlCommand::new(&cfg);
        assert_eq!(dl.fetch(&link()).unwrap(), Attempt::Success);
    }

    #[cfg(unix)]
    #[test]
    fn pipe_mode_still_vetoes_mixed_stderr() {
        let script = stub_script(
            "echo 'ERROR: File already exists at /tmp/x' >&2\n\
             echo 'ERROR: quota exceeded' >&2\n\
             exit 1",
        );
        let mut cfg = MegaqConfig::default();
        cfg.downloader_program = script.display().to_string();
        cfg.pipe_output = true;
        let mut dl = MegadlCommand::new(&cfg);
        assert_eq!(dl.fetch(&link()).unwrap(), Attempt::Failure);
    }

    #[test]
    fn missing_program_is_an_invoke_error() {
        let mut cfg = MegaqConfig::default();
        cfg.downloader_program = "/nonexistent/megaq-test-downloader".to_string();
        let mut dl = MegadlCommand::new(&cfg);
        let err = dl.fetch(&link()).unwrap_err();
        assert!(err.to_string().contains("could not run"));
    }
}
