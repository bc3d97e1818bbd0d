//! Size-based rotation of the JSON-lines file.
//!
//! The first generation of a log is `<prefix>.log`. Once it grows past the
//! threshold, writes move on to `<prefix>.log.1`, then `<prefix>.log.2`, and
//! so on. Existing files are never renamed or truncated; rotation only ever
//! moves forward to a generation that is missing or still has room.

use crate::config::LOG_EXTENSION;
use crate::error::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Returns the path that follows `path` in the generation sequence.
///
/// `x.log` becomes `x.log.1` and `x.log.N` becomes `x.log.N+1`.
///
/// # Errors
///
/// Returns [`Error::InvalidSuffix`] when the extension is neither `log` nor a
/// number.
pub fn next_generation(path: &Path) -> Result<PathBuf> {
    let invalid = || Error::InvalidSuffix {
        path: path.to_path_buf(),
    };
    let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(invalid)?;

    if ext == LOG_EXTENSION {
        let mut name = path.as_os_str().to_owned();
        name.push(".1");
        return Ok(PathBuf::from(name));
    }

    let index: u64 = ext.parse().map_err(|_| invalid())?;
    let next = index.checked_add(1).ok_or_else(invalid)?;
    Ok(path.with_extension(next.to_string()))
}

/// Owns the active log file and decides when to move to the next generation.
///
/// Not synchronized on its own; the logger keeps it behind a mutex so that
/// "check, append, count" runs as one critical section.
#[derive(Debug)]
pub struct RotationManager {
    base_path: PathBuf,
    active_path: PathBuf,
    active_file: File,
    max_size_bytes: u64,
    check_interval: u64,
    write_counter: u64,
}

impl RotationManager {
    /// Validates `directory` and opens the first generation of `base_path`
    /// that is missing or within `max_size_bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingDirectory`] or [`Error::NotADirectory`] when
    /// `directory` is unusable, and any error from
    /// [`ensure_file`](Self::ensure_file).
    pub fn open(
        directory: &Path,
        base_path: PathBuf,
        max_size_bytes: u64,
        check_interval: u64,
    ) -> Result<Self> {
        match fs::metadata(directory) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(Error::NotADirectory(directory.to_path_buf())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::MissingDirectory(directory.to_path_buf()));
            }
            Err(source) => {
                return Err(Error::Stat {
                    path: directory.to_path_buf(),
                    source,
                });
            }
        }

        let (active_path, active_file) = find_writable(&base_path, max_size_bytes)?;
        info!(path = %active_path.display(), "stashlog: file output enabled");

        Ok(Self {
            base_path,
            active_path,
            active_file,
            max_size_bytes,
            check_interval,
            write_counter: 0,
        })
    }

    /// Makes the first usable generation starting at `base_path` the active
    /// file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stat`], [`Error::Open`] or [`Error::InvalidSuffix`];
    /// all of them are fatal.
    pub fn ensure_file(&mut self, base_path: &Path) -> Result<()> {
        let (path, file) = find_writable(base_path, self.max_size_bytes)?;
        if path != self.active_path {
            info!(
                from = %self.active_path.display(),
                to = %path.display(),
                "stashlog: rotated log file"
            );
        }
        self.active_path = path;
        self.active_file = file;
        Ok(())
    }

    /// Returns `true` when `path` has grown past the threshold and a fresh
    /// [`ensure_file`](Self::ensure_file) is required.
    ///
    /// An empty path never needs a reset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Stat`] when the file cannot be inspected, for example
    /// because it was deleted underneath the logger.
    pub fn should_reset(&self, path: &Path) -> Result<bool> {
        if path.as_os_str().is_empty() {
            return Ok(false);
        }
        let size = file_size(path)?;
        Ok(size > self.max_size_bytes)
    }

    /// Appends one encoded entry, running the rotation check first when the
    /// write counter lands on the check interval.
    ///
    /// The check is a fixed-window approximation: between two checks the
    /// active file can exceed the threshold by up to `check_interval - 1`
    /// entries.
    ///
    /// # Errors
    ///
    /// Rotation failures are returned as fatal errors. A failed append is
    /// returned as [`Error::Write`] and does not advance the counter.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        if self.check_due() && self.should_reset(&self.active_path)? {
            let base = self.base_path.clone();
            self.ensure_file(&base)?;
        }

        self.active_file.write_all(bytes).map_err(Error::Write)?;
        self.write_counter += 1;
        Ok(())
    }

    fn check_due(&self) -> bool {
        self.check_interval > 0
            && self.write_counter > 0
            && self.write_counter % self.check_interval == 0
    }

    /// Path of the file currently receiving writes.
    #[must_use]
    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    /// First-generation path rotation restarts from.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Rotation threshold in bytes.
    #[must_use]
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Number of successful appends.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.write_counter
    }
}

fn find_writable(base_path: &Path, max_size_bytes: u64) -> Result<(PathBuf, File)> {
    let mut candidate = base_path.to_path_buf();
    loop {
        match fs::metadata(&candidate) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %candidate.display(), "stashlog: creating log file");
                break;
            }
            Err(source) => {
                return Err(Error::Stat {
                    path: candidate,
                    source,
                });
            }
            Ok(meta) if meta.len() > max_size_bytes => {
                candidate = next_generation(&candidate)?;
            }
            Ok(_) => break,
        }
    }

    let file = open_append(&candidate)?;
    Ok((candidate, file))
}

fn open_append(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn file_size(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|source| Error::Stat {
            path: path.to_path_buf(),
            source,
        })
}
