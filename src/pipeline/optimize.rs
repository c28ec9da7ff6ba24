//! Optimize stage: wasm-opt size pass with atomic replace
//!
//! The optimizer writes to a temporary file next to the module, and only a
//! successful run renames it over the original. A crash or nonzero exit
//! leaves the pre-optimization module fully intact - never truncated.

use std::path::PathBuf;

use crate::config::Settings;
use crate::error::{BundleError, BundleResult};
use crate::pipeline::bindgen::BoundModule;
use crate::pipeline::{stage_failure, Stage};
use crate::tool::ToolRunner;

/// Output of the optimize stage: same path, smaller module.
#[derive(Debug, Clone)]
pub struct OptimizedModule {
    pub module: PathBuf,
    pub size_before: u64,
    pub size_after: u64,
}

pub fn run(
    settings: &Settings,
    runner: &ToolRunner,
    bound: &BoundModule,
) -> BundleResult<OptimizedModule> {
    let source_meta =
        std::fs::metadata(&bound.module).map_err(|_| BundleError::ArtifactMissing {
            path: bound.module.clone(),
        })?;
    let size_before = source_meta.len();

    let dir = bound
        .module
        .parent()
        .unwrap_or_else(|| std::path::Path::new("."));
    let tmp = tempfile::Builder::new()
        .prefix(".wasm-opt-")
        .suffix(".wasm")
        .tempfile_in(dir)?;

    let args = vec![
        format!("-O{}", settings.opt_level),
        "-o".to_string(),
        tmp.path().display().to_string(),
        bound.module.display().to_string(),
    ];

    let wasm_opt = settings.toolchain.wasm_opt.display().to_string();
    let output = runner
        .run(&wasm_opt, &args, Some(&settings.project_root))
        .map_err(|f| stage_failure(Stage::Optimize, "wasm-opt", f))?;

    if !output.success() {
        // tmp drops here and removes itself; the original module stands.
        return Err(BundleError::Optimize {
            code: output.code,
            stderr: output.stderr,
        });
    }

    // The temp file is created mode 0600; carry the module's own permissions
    // over so the rename does not change how the bundle deploys.
    std::fs::set_permissions(tmp.path(), source_meta.permissions())?;
    tmp.persist(&bound.module)
        .map_err(|e| BundleError::Io(e.error))?;

    let size_after = std::fs::metadata(&bound.module)?.len();
    Ok(OptimizedModule {
        module: bound.module.clone(),
        size_before,
        size_after,
    })
}
