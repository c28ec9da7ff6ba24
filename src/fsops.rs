//! Filesystem primitives for the bundle pipeline
//!
//! The output directory is append/overwrite only: nothing here ever removes
//! files that were already present.

use std::fs;
use std::path::Path;

use crate::error::{BundleError, BundleResult};

/// Create a directory (and parents) if it does not exist.
///
/// Idempotent: existing directories and their contents are left untouched.
pub fn ensure_dir(path: &Path) -> BundleResult<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Copy a single file, unconditionally overwriting the destination.
pub fn copy_file(src: &Path, dest: &Path) -> BundleResult<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| copy_err(parent, &e))?;
    }
    fs::copy(src, dest).map_err(|e| copy_err(src, &e))?;
    Ok(())
}

/// Recursively copy `src` into `dest`, overwriting existing files.
///
/// Last-write-wins full re-merge: this is not an incremental sync, and files
/// already present under `dest` that have no counterpart in `src` are kept.
/// The source tree is never mutated.
pub fn copy_dir_all(src: &Path, dest: &Path) -> BundleResult<()> {
    if !src.is_dir() {
        return Err(BundleError::AssetCopy {
            path: src.to_path_buf(),
            message: "source directory not found".to_string(),
        });
    }
    fs::create_dir_all(dest).map_err(|e| copy_err(dest, &e))?;
    for entry in fs::read_dir(src).map_err(|e| copy_err(src, &e))? {
        let entry = entry.map_err(|e| copy_err(src, &e))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| copy_err(&from, &e))?;
        if file_type.is_dir() {
            copy_dir_all(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| copy_err(&from, &e))?;
        }
    }
    Ok(())
}

fn copy_err(path: &Path, e: &std::io::Error) -> BundleError {
    BundleError::AssetCopy {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}
