//! Error types.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while configuring a logger or writing to its file sink.
///
/// Everything except [`Error::Write`] is fatal: a logger that cannot
/// establish where to write stops the process rather than continue silently.
/// See [`Error::is_fatal`].
#[derive(Error, Debug)]
pub enum Error {
    /// The configured log directory does not exist.
    #[error("directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// The configured log directory is a file.
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// An oversized log file carries a generation suffix that is not a number.
    #[error("invalid rotation suffix in {}", .path.display())]
    InvalidSuffix {
        /// The offending file.
        path: PathBuf,
    },

    /// Reading file metadata failed.
    #[error("failed to stat {}: {source}", .path.display())]
    Stat {
        /// The file being inspected.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Opening a log file for append failed.
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        /// The file being opened.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Appending an entry failed.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// An entry could not be converted to JSON.
    #[error("cannot convert fields to JSON: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The configuration source could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Returns `true` when the logger cannot continue after this error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Write(_) | Self::Serialize(_))
    }
}

/// A specialized [`Result`] type for logger operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Callback for degraded (non-fatal) failures during logging.
///
/// # Example
///
/// ```rust
/// use stashlog::{Config, Logger};
///
/// let logger = Logger::open(Config::default())
///     .unwrap()
///     .with_error_handler(|err| eprintln!("stashlog: {err}"));
/// # drop(logger);
/// ```
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::MissingDirectory(PathBuf::from("/nope")).is_fatal());
        assert!(
            Error::InvalidSuffix {
                path: PathBuf::from("x.log.old")
            }
            .is_fatal()
        );
        assert!(!Error::Write(io::Error::other("disk full")).is_fatal());
    }

    #[test]
    fn test_display_names_path() {
        let err = Error::Open {
            path: PathBuf::from("/var/log/app.log"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let msg = err.to_string();
        assert!(msg.contains("/var/log/app.log"), "{msg}");
        assert!(std::error::Error::source(&err).is_some());
    }
}
