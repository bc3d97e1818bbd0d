//! The logger handle and its emission pipeline.

use crate::caller::{CallerInfo, CallerMode};
use crate::config::Config;
use crate::entry::Entry;
use crate::error::{Error, ErrorHandler, Result};
use crate::layer::StashLayer;
use crate::render::{Fields, LAST_RESORT_LINE, Record, TimeFunction, now_local};
use crate::rotation::RotationManager;
use crate::Level;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};
use std::panic::Location;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::warn;

/// Exit status after a [`Level::Panic`] entry.
pub const PANIC_EXIT_CODE: i32 = 2;

/// Exit status when the file sink cannot be established or rotated.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Runtime-adjustable settings, read once per call.
#[derive(Clone)]
struct Settings {
    level: Level,
    console_output: bool,
    color: bool,
    caller_mode: CallerMode,
    time_function: TimeFunction,
    error_handler: Option<ErrorHandler>,
}

/// Internal logger state.
struct LoggerInner {
    settings: RwLock<Settings>,
    console: Mutex<Box<dyn Write + Send>>,
    /// Serializes "check rotation, append, count" across threads.
    sink: Option<Mutex<RotationManager>>,
    /// Whether we've already warned about a degraded console write.
    console_warned: AtomicBool,
    /// Whether we've already warned about a degraded file write.
    file_warned: AtomicBool,
}

/// A structured logger instance.
///
/// Cloning is cheap and yields a handle to the same logger: clones share
/// settings, console target and the rotating file.
///
/// ```rust,no_run
/// use stashlog::{Config, Level, Logger};
///
/// let logger = Logger::open(Config {
///     directory: Some("/var/log/myapp".into()),
///     filename_prefix: "api".into(),
///     max_size_mb: 50,
///     minimum_level: Level::Info,
///     ..Default::default()
/// })?;
///
/// logger.with_field("port", 8080).info("listening");
/// # Ok::<(), stashlog::Error>(())
/// ```
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let settings = self.settings();
        f.debug_struct("Logger")
            .field("level", &settings.level)
            .field("console_output", &settings.console_output)
            .field("caller_mode", &settings.caller_mode)
            .field("active_path", &self.active_path())
            .finish()
    }
}

impl Logger {
    /// Creates a console-only logger with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(&Config::default(), None)
    }

    /// Creates a logger from `config`, opening the file sink when a
    /// directory is configured.
    ///
    /// # Errors
    ///
    /// Returns a fatal [`Error`] when the directory does not exist or no
    /// writable generation of the log file can be opened.
    pub fn open(config: Config) -> Result<Self> {
        let sink = match (&config.directory, config.log_path()) {
            (Some(dir), Some(base)) => Some(RotationManager::open(
                dir,
                base,
                config.max_size_bytes(),
                config.check_interval,
            )?),
            _ => None,
        };
        Ok(Self::from_parts(&config, sink))
    }

    /// Like [`open`](Self::open), but reports a failure as a fatal entry on
    /// the console and exits with [`FATAL_EXIT_CODE`].
    #[track_caller]
    #[must_use]
    pub fn open_or_exit(config: Config) -> Self {
        match Self::open(config.clone()) {
            Ok(logger) => logger,
            Err(err) => {
                let fallback = Self::from_parts(
                    &Config {
                        directory: None,
                        console_output: true,
                        ..config
                    },
                    None,
                );
                fallback
                    .with_field("error", err.to_string())
                    .fatal("cannot open log output");
                process::exit(FATAL_EXIT_CODE)
            }
        }
    }

    fn from_parts(config: &Config, sink: Option<RotationManager>) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                settings: RwLock::new(Settings {
                    level: config.minimum_level,
                    console_output: config.console_output,
                    color: config.color,
                    caller_mode: CallerMode::default(),
                    time_function: now_local,
                    error_handler: None,
                }),
                console: Mutex::new(Box::new(io::stdout())),
                sink: sink.map(Mutex::new),
                console_warned: AtomicBool::new(false),
                file_warned: AtomicBool::new(false),
            }),
        }
    }

    fn settings(&self) -> Settings {
        self.inner
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, f: impl FnOnce(&mut Settings)) {
        let mut settings = self
            .inner
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut settings);
    }

    /// Sets the minimum log level.
    pub fn set_level(&self, level: Level) {
        self.update(|s| s.level = level);
    }

    /// Returns the current minimum log level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.settings().level
    }

    /// Whether an entry at `level` would be written.
    #[must_use]
    pub fn is_enabled(&self, level: Level) -> bool {
        level >= self.level()
    }

    /// Enables or disables console output.
    pub fn set_console_output(&self, enabled: bool) {
        self.update(|s| s.console_output = enabled);
    }

    /// Enables or disables ANSI colors on the console.
    pub fn set_color(&self, enabled: bool) {
        self.update(|s| s.color = enabled);
    }

    /// Sets how caller locations are found.
    pub fn set_caller_mode(&self, mode: CallerMode) {
        self.update(|s| s.caller_mode = mode);
    }

    /// Sets the clock used to stamp entries.
    pub fn set_time_function(&self, time_function: TimeFunction) {
        self.update(|s| s.time_function = time_function);
    }

    /// Redirects console lines to `writer` (stdout by default).
    pub fn set_console_writer(&self, writer: impl Write + Send + 'static) {
        let mut console = self
            .inner
            .console
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *console = Box::new(writer);
    }

    /// Sets a handler for degraded failures.
    ///
    /// Without a handler, the first failure is reported on stderr and later
    /// ones are dropped silently.
    #[must_use]
    pub fn with_error_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.update(|s| s.error_handler = Some(Arc::new(handler)));
        self
    }

    /// Path of the file currently receiving entries, if file output is on.
    #[must_use]
    pub fn active_path(&self) -> Option<PathBuf> {
        self.inner.sink.as_ref().map(|sink| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .active_path()
                .to_path_buf()
        })
    }

    /// Number of entries appended to the file sink.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.inner.sink.as_ref().map_or(0, |sink| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .write_count()
        })
    }

    /// Starts an entry with no fields.
    pub fn entry(&self) -> Entry<'_> {
        Entry::new(self)
    }

    /// Starts an entry with `fields`.
    pub fn with_fields<I, K, V>(&self, fields: I) -> Entry<'_>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.entry().with_fields(fields)
    }

    /// Starts an entry with one field.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Entry<'_> {
        self.entry().with_field(key, value)
    }

    /// Returns a [`tracing_subscriber::Layer`] that forwards `tracing`
    /// events to this logger.
    #[must_use]
    pub fn layer(&self) -> StashLayer {
        StashLayer::new(self.clone())
    }

    /// Logs a message with fields at `level`.
    ///
    /// A [`Level::Panic`] entry terminates the process once written.
    #[track_caller]
    pub fn log(&self, level: Level, msg: &str, fields: Fields) {
        self.emit_tracked(level, msg, fields, Location::caller());
        if level.is_terminal() {
            self.terminate();
        }
    }

    /// Logs with an explicit caller location instead of the call site.
    pub fn log_at(&self, level: Level, msg: &str, fields: Fields, caller: CallerInfo) {
        self.emit(level, msg, fields, |_| caller);
        if level.is_terminal() {
            self.terminate();
        }
    }

    /// Logs a debug message.
    #[track_caller]
    pub fn debug(&self, msg: &str) {
        self.log(Level::Debug, msg, Fields::new());
    }

    /// Logs an info message.
    #[track_caller]
    pub fn info(&self, msg: &str) {
        self.log(Level::Info, msg, Fields::new());
    }

    /// Logs a warning message.
    #[track_caller]
    pub fn warn(&self, msg: &str) {
        self.log(Level::Warn, msg, Fields::new());
    }

    /// Logs an error message.
    #[track_caller]
    pub fn error(&self, msg: &str) {
        self.log(Level::Error, msg, Fields::new());
    }

    /// Logs a fatal message. The process keeps running.
    #[track_caller]
    pub fn fatal(&self, msg: &str) {
        self.log(Level::Fatal, msg, Fields::new());
    }

    /// Logs a panic message, then exits with [`PANIC_EXIT_CODE`].
    #[track_caller]
    pub fn panic(&self, msg: &str) -> ! {
        self.emit_tracked(Level::Panic, msg, Fields::new(), Location::caller());
        self.terminate()
    }

    pub(crate) fn emit_tracked(
        &self,
        level: Level,
        msg: &str,
        fields: Fields,
        location: &'static Location<'static>,
    ) {
        self.emit(level, msg, fields, |mode| CallerInfo::resolve(mode, location));
    }

    /// Filter, render, print, append. Returns without writing anything when
    /// `level` is below the minimum; the caller is only resolved afterwards.
    fn emit(
        &self,
        level: Level,
        msg: &str,
        fields: Fields,
        caller: impl FnOnce(CallerMode) -> CallerInfo,
    ) {
        let settings = self.settings();
        if level < settings.level {
            return;
        }

        let record = Record::new(
            level,
            msg,
            fields,
            caller(settings.caller_mode),
            &(settings.time_function)(),
        );

        if settings.console_output {
            let line = record.console_line(settings.color);
            let result = {
                let mut console = self
                    .inner
                    .console
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                writeln!(console, "{line}")
            };
            if let Err(e) = result {
                Self::report_degraded(&Error::Write(e), &settings, &self.inner.console_warned);
            }
        }

        let Some(sink) = &self.inner.sink else {
            return;
        };

        let bytes = match record.to_json_line() {
            Ok(bytes) => Cow::Owned(bytes),
            Err(err) => {
                Self::report_degraded(&err, &settings, &self.inner.file_warned);
                Cow::Borrowed(LAST_RESORT_LINE)
            }
        };

        let result = sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .append(&bytes);

        match result {
            Ok(()) => {}
            Err(err) if err.is_fatal() => fatal_exit(&err),
            Err(err) => Self::report_degraded(&err, &settings, &self.inner.file_warned),
        }
    }

    /// Hands `err` to the error handler, or warns once per sink via `warned`.
    fn report_degraded(err: &Error, settings: &Settings, warned: &AtomicBool) {
        if let Some(handler) = &settings.error_handler {
            handler(err);
        } else if !warned.swap(true, Ordering::Relaxed) {
            warn!(error = %err, "stashlog: degraded write");
            let _ = io::stderr().write_all(format!("stashlog: {err}\n").as_bytes());
        }
    }

    /// Flushes the console writer, then exits after a panic entry.
    pub(crate) fn terminate(&self) -> ! {
        self.flush_console();
        process::exit(PANIC_EXIT_CODE)
    }

    fn flush_console(&self) {
        let mut console = self
            .inner
            .console
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let _ = console.flush();
    }
}

/// Exits after the file sink became unusable. Bypasses rendering entirely.
fn fatal_exit(err: &Error) -> ! {
    let _ = io::stderr().write_all(format!("stashlog: fatal: {err}\n").as_bytes());
    process::exit(FATAL_EXIT_CODE)
}
