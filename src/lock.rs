//! Single-run lock
//!
//! Two concurrent runs against the same project would interleave writes into
//! the output directory. An advisory `fs2` lock in the build cache directory
//! serializes them; waiting is not supported, the second run fails fast.

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;

use crate::error::{BundleError, BundleResult};

const LOCK_FILE: &str = "wasmbundle.lock";

/// Held for the duration of a pipeline run. Unlocks on drop.
#[derive(Debug)]
pub struct RunLock {
    file: File,
}

impl RunLock {
    /// Acquire the exclusive run lock under `target_dir`.
    ///
    /// The lock file lives in the build cache, not the output directory, so
    /// the deployable bundle stays free of bookkeeping files.
    pub fn acquire(target_dir: &Path) -> BundleResult<Self> {
        std::fs::create_dir_all(target_dir)?;
        let path = target_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| BundleError::OutputLocked { path })?;
        Ok(Self { file })
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquire_creates_lock_file() {
        let dir = tempdir().unwrap();
        let _lock = RunLock::acquire(dir.path()).unwrap();
        assert!(dir.path().join(LOCK_FILE).exists());
    }

    #[test]
    fn second_acquire_fails_while_held() {
        let dir = tempdir().unwrap();
        let _lock = RunLock::acquire(dir.path()).unwrap();
        let err = RunLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, BundleError::OutputLocked { .. }));
    }

    #[test]
    fn lock_released_on_drop() {
        let dir = tempdir().unwrap();
        {
            let _lock = RunLock::acquire(dir.path()).unwrap();
        }
        assert!(RunLock::acquire(dir.path()).is_ok());
    }
}
