//! Logger configuration.

use crate::Level;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default size threshold, in megabytes, when `max_size_mb` is zero.
pub const DEFAULT_MAX_SIZE_MB: u64 = 10;

/// File name prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "log";

/// Extension of the first generation of every log file.
pub const LOG_EXTENSION: &str = "log";

/// Number of appends between two rotation checks.
///
/// A file can grow past its threshold by up to `interval - 1` entries before
/// the next check notices. Lower values tighten the bound at the cost of one
/// `stat` call per check.
pub const DEFAULT_CHECK_INTERVAL: u64 = 100;

/// Logger configuration.
///
/// Read once by [`Logger::open`](crate::Logger::open). Every field has a
/// default, so a TOML section only needs the keys it changes:
///
/// ```rust
/// use stashlog::{Config, Level};
///
/// let config = Config::from_toml_str(
///     r#"
///     directory = "/var/log/myapp"
///     filename_prefix = "api"
///     minimum_level = "warn"
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.minimum_level, Level::Warn);
/// assert!(config.log_path().unwrap().ends_with("api.log"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rotation threshold in megabytes. Zero keeps the 10 MB default.
    pub max_size_mb: u64,
    /// Directory for the JSON-lines file. `None` disables file output.
    /// The directory must already exist.
    pub directory: Option<PathBuf>,
    /// File name prefix; the active file is `<prefix>.log`.
    pub filename_prefix: String,
    /// Entries below this level are discarded before rendering.
    pub minimum_level: Level,
    /// Whether entries are printed to the console.
    pub console_output: bool,
    /// Appends between two rotation checks. Zero disables the check.
    pub check_interval: u64,
    /// Whether console lines carry ANSI colors.
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size_mb: 0,
            directory: None,
            filename_prefix: String::new(),
            minimum_level: Level::Debug,
            console_output: true,
            check_interval: DEFAULT_CHECK_INTERVAL,
            color: true,
        }
    }
}

impl Config {
    /// Parses a configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) on malformed input or
    /// unknown level names.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Rotation threshold in bytes.
    #[must_use]
    pub fn max_size_bytes(&self) -> u64 {
        let mb = if self.max_size_mb == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            self.max_size_mb
        };
        mb.saturating_mul(1024 * 1024)
    }

    /// File name prefix with the default applied.
    #[must_use]
    pub fn prefix(&self) -> &str {
        if self.filename_prefix.is_empty() {
            DEFAULT_PREFIX
        } else {
            &self.filename_prefix
        }
    }

    /// First-generation log path, or `None` when file output is disabled.
    #[must_use]
    pub fn log_path(&self) -> Option<PathBuf> {
        self.directory.as_deref().map(|dir| base_log_path(dir, self.prefix()))
    }
}

/// Builds `<dir>/<prefix>.log`.
pub(crate) fn base_log_path(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{prefix}.{LOG_EXTENSION}"))
}
