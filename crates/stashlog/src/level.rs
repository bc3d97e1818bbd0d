//! Severity levels.

use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Log level for filtering messages.
///
/// Levels are totally ordered from [`Level::Debug`] (most verbose) to
/// [`Level::Panic`] (terminates the process after the entry is written).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum Level {
    /// Debug level (most verbose).
    Debug = -4,
    /// Info level (default).
    Info = 0,
    /// Warning level.
    Warn = 4,
    /// Error level.
    Error = 8,
    /// Fatal level. Written like any other entry; does not exit.
    Fatal = 12,
    /// Panic level. The process exits once the entry has been appended.
    Panic = 16,
}

impl Level {
    /// Every level, lowest severity first.
    pub const ALL: [Self; 6] = [
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Fatal,
        Self::Panic,
    ];

    /// Returns the string representation of the level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::Panic => "panic",
        }
    }

    /// Returns the four-column uppercase label used on the console.
    #[must_use]
    pub fn as_upper_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBU",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERRO",
            Self::Fatal => "FATA",
            Self::Panic => "PANI",
        }
    }

    /// Returns the display color band for this level.
    #[must_use]
    pub fn color_band(&self) -> ColorBand {
        match self {
            Self::Debug => ColorBand::Dim,
            Self::Warn => ColorBand::Amber,
            Self::Error | Self::Fatal | Self::Panic => ColorBand::Red,
            Self::Info => ColorBand::Default,
        }
    }

    /// Whether an entry at this level ends the process.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Panic)
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (*self as i32).cmp(&(*other as i32))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            "panic" => Ok(Self::Panic),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid log level string.
///
/// Accepted strings (case-insensitive): `"debug"`, `"info"`, `"warn"`,
/// `"error"`, `"fatal"`, `"panic"`.
///
/// # Example
///
/// ```rust
/// use stashlog::Level;
/// use std::str::FromStr;
///
/// assert!(Level::from_str("panic").is_ok());
/// assert!(Level::from_str("PANIC").is_ok());
/// assert!(Level::from_str("warning").is_err());
/// ```
#[derive(Error, Debug, Clone)]
#[error("invalid level: {0:?}")]
pub struct ParseLevelError(String);

/// A specialized [`Result`] type for level parsing operations.
pub type ParseResult<T> = std::result::Result<T, ParseLevelError>;

/// Console color group for a level label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBand {
    /// Faint text.
    Dim,
    /// Yellow text.
    Amber,
    /// Red text.
    Red,
    /// Terminal default.
    Default,
}

impl ColorBand {
    /// Paints `text` in this band.
    #[must_use]
    pub fn paint(self, text: &str) -> ColoredString {
        match self {
            Self::Dim => text.dimmed(),
            Self::Amber => text.yellow(),
            Self::Red => text.red(),
            Self::Default => text.normal(),
        }
    }
}
