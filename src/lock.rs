//! Repository-scoped advisory file lock.
//!
//! State-mutating operations (create, remove, clean) serialize on a lock
//! file inside the repository's common git directory, so concurrent `wtr`
//! processes (and concurrent Managers within one process) never interleave
//! worktree mutations. Read-only operations deliberately skip the lock.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};

/// Poll interval while contending for the lock.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// An acquired exclusive lock. Released on [`Lock::release`] or drop.
#[derive(Debug)]
pub struct Lock {
    path: PathBuf,
    file: Option<File>,
}

impl Lock {
    /// Acquire an exclusive advisory lock at `path`, waiting at most
    /// `timeout`.
    ///
    /// Fails with [`Error::LockTimeout`] when the deadline passes, or
    /// [`Error::Cancelled`] when the token fires first, including a token
    /// that was already cancelled on entry.
    pub fn acquire(path: &Path, timeout: Duration, cancel: &CancelToken) -> Result<Lock> {
        cancel.check()?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    return Ok(Lock {
                        path: path.to_path_buf(),
                        file: Some(file),
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {}
                // fs2 reports contention as its own error value on some
                // platforms rather than WouldBlock.
                Err(err) if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {}
                Err(err) => return Err(err.into()),
            }

            if Instant::now() >= deadline {
                return Err(Error::LockTimeout {
                    path: path.to_path_buf(),
                });
            }
            cancel.check()?;
            std::thread::sleep(POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now())));
        }
    }

    /// Release the lock. Idempotent; also happens on drop.
    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = fs2::FileExt::unlock(&file);
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        self.release();
    }
}
