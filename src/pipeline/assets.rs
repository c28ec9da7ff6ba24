//! Asset-merge stage: static tree + entry document into the out-dir
//!
//! Full re-merge each run, last-write-wins. Sources are read-only. On
//! failure partial copies may remain; there is no rollback, the error names
//! the path that failed so deployment tooling can decide what to do.

use std::path::PathBuf;

use crate::config::Settings;
use crate::error::{BundleError, BundleResult};
use crate::fsops;
use crate::pipeline::bindgen::BoundModule;

/// Output of the asset-merge stage.
#[derive(Debug, Clone)]
pub struct MergedAssets {
    /// Entry document inside the out-dir
    pub entry: PathBuf,
}

pub fn run(settings: &Settings, bound: &BoundModule) -> BundleResult<MergedAssets> {
    fsops::copy_dir_all(&settings.assets_dir, &bound.out_dir.join("assets"))?;

    let entry_name = settings
        .entry_file
        .file_name()
        .ok_or_else(|| BundleError::AssetCopy {
            path: settings.entry_file.clone(),
            message: "entry file has no file name".to_string(),
        })?;
    let entry = bound.out_dir.join(entry_name);
    fsops::copy_file(&settings.entry_file, &entry)?;

    Ok(MergedAssets { entry })
}
