use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Placeholder in a benign prefix that expands to the link of the current attempt.
pub const LINK_PLACEHOLDER: &str = "{link}";

/// Global configuration loaded from `~/.config/megaq/config.toml`.
///
/// Command-line flags override individual fields for one run; the file holds
/// the operator's defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MegaqConfig {
    /// External downloader program invoked once per attempt.
    pub downloader_program: String,
    /// Speed limit passed through as `--limit-speed=<N>` (0 = unlimited).
    pub speed_limit: u64,
    /// Seconds to wait between retries of a failed link.
    pub retry_interval_secs: u64,
    /// Mirror the downloader's own stdout/stderr to the terminal.
    pub pipe_output: bool,
    /// Stderr line prefixes that mean "already downloaded" despite a non-zero
    /// exit. `{link}` expands to the link of the current attempt.
    #[serde(default = "default_benign_prefixes")]
    pub benign_prefixes: Vec<String>,
}

fn default_benign_prefixes() -> Vec<String> {
    vec![
        "ERROR: File already exists at ".to_string(),
        // megadl prints this exact misspelling; match it verbatim.
        format!("ERROR: Download failed for '{LINK_PLACEHOLDER}': Can't rename donwloaded temporary file "),
    ]
}

impl Default for MegaqConfig {
    fn default() -> Self {
        Self {
            downloader_program: "megadl".to_string(),
            speed_limit: 0,
            retry_interval_secs: 60,
            pipe_output: false,
            benign_prefixes: default_benign_prefixes(),
        }
    }
}

impl MegaqConfig {
    /// Wait between two retries of the same link.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("megaq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MegaqConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MegaqConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: MegaqConfig = toml::from_str(&data)?;
    Ok(cfg)
}
