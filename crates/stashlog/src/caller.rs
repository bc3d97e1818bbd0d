//! Caller location reported in the `file` and `line` fields.

use backtrace::Backtrace;
use std::panic::Location;

/// How the logger finds the source location of a log call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallerMode {
    /// Use the location recorded by `#[track_caller]` on the logging methods.
    ///
    /// Costs nothing at runtime and survives inlining.
    #[default]
    Tracked,
    /// Walk the stack and report the first frame outside this crate, after
    /// skipping `skip` more frames.
    ///
    /// Useful when log calls go through an application-level wrapper that
    /// is not itself `#[track_caller]`: set `skip` to the wrapper depth.
    ///
    /// # Performance Warning
    ///
    /// Captures and symbolizes a full backtrace on every log call, which is
    /// orders of magnitude slower than [`CallerMode::Tracked`]. Falls back to
    /// the tracked location when symbols are unavailable.
    Backtrace {
        /// Frames to skip past the first one outside this crate.
        skip: usize,
    },
}

/// Caller information attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerInfo {
    /// Source file name without its directory.
    pub file: String,
    /// Line number.
    pub line: u32,
}

impl CallerInfo {
    /// Builds caller information from a file path and line.
    #[must_use]
    pub fn new(file: &str, line: u32) -> Self {
        Self {
            file: base_name(file).to_string(),
            line,
        }
    }

    /// Builds caller information from a `#[track_caller]` location.
    #[must_use]
    pub fn from_location(location: &Location<'_>) -> Self {
        Self::new(location.file(), location.line())
    }

    /// Resolves the caller according to `mode`, using `tracked` when the
    /// stack cannot be symbolized.
    #[must_use]
    pub fn resolve(mode: CallerMode, tracked: &Location<'_>) -> Self {
        match mode {
            CallerMode::Tracked => Self::from_location(tracked),
            CallerMode::Backtrace { skip } => {
                Self::capture(skip).unwrap_or_else(|| Self::from_location(tracked))
            }
        }
    }

    /// Extracts caller information from the current call stack.
    ///
    /// Symbols belonging to this crate or to the `backtrace` crate are
    /// skipped, then `skip` further symbols.
    ///
    /// A physical frame lists one symbol per inlined function, innermost
    /// first, so each symbol counts as its own call level.
    #[must_use]
    pub fn capture(skip: usize) -> Option<Self> {
        let bt = Backtrace::new();
        let mut remaining = skip;

        for symbol in bt.frames().iter().flat_map(|frame| frame.symbols()) {
            let name = symbol.name().map(|n| n.to_string()).unwrap_or_default();
            if is_internal(&name) {
                continue;
            }
            if remaining > 0 {
                remaining -= 1;
                continue;
            }

            let file = symbol.filename().and_then(|p| p.to_str())?;
            let line = symbol.lineno().unwrap_or(0);
            return Some(Self::new(file, line));
        }

        None
    }
}

fn is_internal(symbol: &str) -> bool {
    symbol.is_empty()
        || symbol.starts_with("stashlog::")
        || symbol.starts_with("<stashlog::")
        || symbol.contains("backtrace::")
}

/// Returns the final path component of `path`.
fn base_name(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path)
}
