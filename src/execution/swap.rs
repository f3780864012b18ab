//! Guarded replacement of the build description

use crate::core::PipelineError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};

/// A staged buildfile swapped in for validation
///
/// Until [`BuildfileSwap::commit`] is called the previous bytes are kept,
/// and dropping the swap writes them back. This also covers early returns
/// and unwinding out of the validation. The staged file is removed on every
/// path.
#[derive(Debug)]
pub struct BuildfileSwap {
    buildfile: PathBuf,
    staged: PathBuf,
    snapshot: Option<Vec<u8>>,
}

impl BuildfileSwap {
    /// Snapshot `buildfile` and replace it with the contents of `staged`
    pub fn begin(buildfile: &Path, staged: &Path) -> Result<Self, PipelineError> {
        let snapshot = std::fs::read(buildfile).map_err(|e| PipelineError::io(buildfile, e))?;
        let replacement = std::fs::read(staged).map_err(|e| PipelineError::io(staged, e))?;

        // Armed before the write, so a failed write still restores
        let swap = Self {
            buildfile: buildfile.to_path_buf(),
            staged: staged.to_path_buf(),
            snapshot: Some(snapshot),
        };
        replace_file(&swap.buildfile, &replacement)?;
        debug!("Swapped {} into {}", staged.display(), buildfile.display());
        Ok(swap)
    }

    /// Keep the staged contents as the live buildfile
    pub fn commit(mut self) -> Result<(), PipelineError> {
        self.snapshot = None;
        self.remove_staged()
    }

    /// Put the previous buildfile back
    pub fn rollback(mut self) -> Result<(), PipelineError> {
        if let Some(snapshot) = &self.snapshot {
            replace_file(&self.buildfile, snapshot)?;
        }
        self.snapshot = None;
        self.remove_staged()
    }

    fn remove_staged(&self) -> Result<(), PipelineError> {
        match std::fs::remove_file(&self.staged) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PipelineError::io(&self.staged, e)),
        }
    }
}

impl Drop for BuildfileSwap {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            warn!("Buildfile swap abandoned, restoring {}", self.buildfile.display());
            if let Err(e) = replace_file(&self.buildfile, &snapshot) {
                error!("Failed to restore {}: {}", self.buildfile.display(), e);
            }
        }
        if let Err(e) = self.remove_staged() {
            warn!("{}", e);
        }
    }
}

/// Replace `path` with `contents` through a rename in the same directory
///
/// Readers see either the old or the new file, never a partial write. The
/// file keeps its permissions.
pub fn replace_file(path: &Path, contents: &[u8]) -> Result<(), PipelineError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PipelineError::io(dir, e))?;
    tmp.write_all(contents)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| PipelineError::io(tmp.path(), e))?;
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| PipelineError::io(tmp.path(), e))?;
    }
    tmp.persist(path)
        .map_err(|e| PipelineError::io(path, e.error))?;
    Ok(())
}
