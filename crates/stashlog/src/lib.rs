#![forbid(unsafe_code)]
// Allow pedantic lints for early-stage API ergonomics.
#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

//! # Stashlog
//!
//! A leveled, structured logger that writes every entry twice: as a
//! colorized console line and as one JSON object per line in a file that
//! rotates by size.
//!
//! - Six ordered levels, from `debug` to `panic`
//! - Key/value fields with JSON values
//! - Caller `file`/`line` injected into every entry
//! - Size-based rotation to `<prefix>.log.1`, `<prefix>.log.2`, ...
//! - A `tracing` layer to route existing instrumentation through the same sink
//!
//! ## Example
//!
//! ```rust,no_run
//! use stashlog::{Config, Logger};
//!
//! let logger = Logger::open(Config {
//!     directory: Some("/tmp/x".into()),
//!     filename_prefix: "t".into(),
//!     max_size_mb: 1,
//!     ..Default::default()
//! })?;
//!
//! logger.with_field("name", "tosone").error("test");
//! # Ok::<(), stashlog::Error>(())
//! ```
//!
//! ## Output
//!
//! Console:
//!
//! ```text
//! ERRO[Jan 2 15:04:05] test                                     name=tosone file=main.rs line=9
//! ```
//!
//! File (`/tmp/x/t.log`):
//!
//! ```text
//! {"file":"main.rs","level":"error","line":9,"msg":"test","name":"tosone","time":"Jan 2 15:04:05"}
//! ```
//!
//! ## Rotation
//!
//! Every [`Config::check_interval`] appends (100 by default) the logger checks
//! the active file against the size threshold and moves to the next
//! generation when it is over. Between checks a file can overshoot the
//! threshold by up to `check_interval - 1` entries.

pub mod caller;
pub mod config;
pub mod entry;
pub mod error;
pub mod layer;
pub mod level;
pub mod logger;
pub mod render;
pub mod rotation;

pub use caller::{CallerInfo, CallerMode};
pub use config::{Config, DEFAULT_CHECK_INTERVAL, DEFAULT_MAX_SIZE_MB, DEFAULT_PREFIX};
pub use entry::Entry;
pub use error::{Error, ErrorHandler, Result};
pub use layer::StashLayer;
pub use level::{ColorBand, Level, ParseLevelError, ParseResult};
pub use logger::{FATAL_EXIT_CODE, Logger, PANIC_EXIT_CODE};
pub use render::{DEFAULT_TIME_FORMAT, Fields, Record, TimeFunction, now_local};
pub use rotation::{RotationManager, next_generation};
pub use serde_json::Value;

/// Standard keys used in log records.
pub mod keys {
    /// Key for timestamp.
    pub const TIMESTAMP: &str = "time";
    /// Key for message.
    pub const MESSAGE: &str = "msg";
    /// Key for level.
    pub const LEVEL: &str = "level";
    /// Key for the caller's source file.
    pub const FILE: &str = "file";
    /// Key for the caller's line number.
    pub const LINE: &str = "line";
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        CallerInfo, CallerMode, Config, Entry, Error, ErrorHandler, Fields, Level, Logger,
        ParseLevelError, ParseResult, Result, StashLayer, Value, keys,
    };
}
