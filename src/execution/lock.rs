//! Exclusive lock around build description updates

use crate::core::PipelineError;
use std::fs::{File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Held while the build description is swapped and validated
///
/// An advisory lock on a file in the repository's `cricic/` directory. The
/// operating system releases it when the guard is dropped or the process
/// dies, so a lock file left on disk never blocks later runs.
#[derive(Debug)]
pub struct RepositoryLock {
    path: PathBuf,
    _file: File,
}

impl RepositoryLock {
    /// Acquire the lock, waiting up to `wait` for another holder
    pub async fn acquire(path: impl Into<PathBuf>, wait: Duration) -> Result<Self, PipelineError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| PipelineError::io(&path, e))?;
        let started = Instant::now();

        loop {
            match file.try_lock() {
                Ok(()) => {
                    // Holder pid, for operators looking at a stuck deploy
                    let mut handle = &file;
                    let _ = file
                        .set_len(0)
                        .and_then(|_| writeln!(handle, "{}", std::process::id()));
                    debug!("Acquired lock {}", path.display());
                    return Ok(Self { path, _file: file });
                }
                Err(TryLockError::WouldBlock) => {
                    if started.elapsed() >= wait {
                        warn!("Gave up waiting for lock {}", path.display());
                        return Err(PipelineError::Locked(path));
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(TryLockError::Error(e)) => return Err(PipelineError::io(path, e)),
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
