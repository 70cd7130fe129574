//! Advisory lock over a storage directory.
//!
//! Every `td` process sharing a data directory coordinates through one
//! `<dir>/lock` file. Single-key reads hold it [`LockMode::Shared`];
//! writes and multi-key transactions hold it [`LockMode::Exclusive`].
//!
//! The lock is owned per open file, not per process: two handles in one
//! process exclude each other just like two processes do. Never acquire a
//! second lock on a directory while holding one.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::ErrorCode;

/// Name of the lock file inside a storage directory.
pub const LOCK_FILE: &str = "lock";

const FIRST_RETRY: Duration = Duration::from_millis(1);
const MAX_RETRY: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shared => "shared",
            Self::Exclusive => "exclusive",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("timed out after {waited:?} waiting for {mode} lock on {}", path.display())]
    Timeout {
        path: PathBuf,
        mode: LockMode,
        waited: Duration,
    },

    #[error("cannot lock {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Io { .. } => ErrorCode::StorageWriteFailed,
        }
    }
}

/// A held directory lock. Dropping it releases the lock.
#[derive(Debug)]
pub struct StorageLock {
    file: File,
}

impl StorageLock {
    /// Lock `dir` in `mode`, polling with backoff until `timeout` passes.
    ///
    /// Blocks the calling thread while waiting.
    ///
    /// # Errors
    ///
    /// - [`LockError::Timeout`] if a conflicting holder outlasts `timeout`.
    /// - [`LockError::Io`] if the lock file cannot be opened or locked.
    pub fn acquire(dir: &Path, mode: LockMode, timeout: Duration) -> Result<Self, LockError> {
        let path = dir.join(LOCK_FILE);
        let io_err = |source: io::Error| LockError::Io {
            path: path.clone(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(io_err)?;

        let contended = fs2::lock_contended_error().raw_os_error();
        let started = Instant::now();
        let mut pause = FIRST_RETRY;
        loop {
            // Qualified calls: newer std has inherent `File` lock methods
            // with a different error type.
            let attempt = match mode {
                LockMode::Shared => FileExt::try_lock_shared(&file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
            };
            match attempt {
                Ok(()) => return Ok(Self { file }),
                Err(err) if err.raw_os_error() == contended => {}
                Err(err) => return Err(io_err(err)),
            }

            let waited = started.elapsed();
            if waited >= timeout {
                return Err(LockError::Timeout { path, mode, waited });
            }
            thread::sleep(pause.min(timeout - waited));
            pause = (pause * 2).min(MAX_RETRY);
        }
    }
}

impl Drop for StorageLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
