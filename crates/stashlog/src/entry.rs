//! Per-call entry builder.

use crate::render::Fields;
use crate::{Level, Logger};
use serde_json::Value;
use std::panic::Location;

/// Accumulates fields for one log call.
///
/// Obtained from [`Logger::entry`], [`Logger::with_fields`] or
/// [`Logger::with_field`]. The level methods consume the entry, so an entry
/// is dispatched at most once.
///
/// ```rust
/// use stashlog::Logger;
///
/// let logger = Logger::new();
/// logger
///     .with_field("request_id", "abc123")
///     .with_field("attempt", 2)
///     .warn("retrying upstream call");
/// ```
#[must_use = "an entry is only written when a level method is called"]
#[derive(Debug)]
pub struct Entry<'a> {
    logger: &'a Logger,
    fields: Fields,
}

impl<'a> Entry<'a> {
    pub(crate) fn new(logger: &'a Logger) -> Self {
        Self {
            logger,
            fields: Fields::new(),
        }
    }

    /// Merges `fields` into the entry. Later values win on key collision.
    pub fn with_fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Adds a single field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Fields accumulated so far.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Writes the entry at `level`.
    ///
    /// A [`Level::Panic`] entry terminates the process once written.
    #[track_caller]
    pub fn log(self, level: Level, msg: &str) {
        if level.is_terminal() {
            self.panic(msg);
        }
        self.logger.emit_tracked(level, msg, self.fields, Location::caller());
    }

    /// Writes a debug entry.
    #[track_caller]
    pub fn debug(self, msg: &str) {
        self.log(Level::Debug, msg);
    }

    /// Writes an info entry.
    #[track_caller]
    pub fn info(self, msg: &str) {
        self.log(Level::Info, msg);
    }

    /// Writes a warning entry.
    #[track_caller]
    pub fn warn(self, msg: &str) {
        self.log(Level::Warn, msg);
    }

    /// Writes an error entry.
    #[track_caller]
    pub fn error(self, msg: &str) {
        self.log(Level::Error, msg);
    }

    /// Writes a fatal entry. The process keeps running.
    #[track_caller]
    pub fn fatal(self, msg: &str) {
        self.log(Level::Fatal, msg);
    }

    /// Writes a panic entry, then exits with
    /// [`PANIC_EXIT_CODE`](crate::PANIC_EXIT_CODE).
    #[track_caller]
    pub fn panic(self, msg: &str) -> ! {
        self.logger
            .emit_tracked(Level::Panic, msg, self.fields, Location::caller());
        self.logger.terminate()
    }
}
