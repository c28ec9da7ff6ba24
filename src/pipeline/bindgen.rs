//! Bindgen stage: wasm-bindgen emits JS glue + relocated module
//!
//! Creates the output directory if absent (idempotent, never clears
//! pre-existing files) and invokes the binding generator for browser
//! ES-module consumption. On failure the raw module from the compile stage
//! is left untouched at its original path.

use std::path::PathBuf;

use crate::config::Settings;
use crate::error::{BundleError, BundleResult};
use crate::fsops;
use crate::pipeline::compile::RawModule;
use crate::pipeline::{stage_failure, Stage};
use crate::tool::ToolRunner;

/// Output of the bindgen stage: the module relocated into the out-dir,
/// with JS glue alongside it.
#[derive(Debug, Clone)]
pub struct BoundModule {
    pub out_dir: PathBuf,
    pub module: PathBuf,
}

pub fn run(settings: &Settings, runner: &ToolRunner, raw: &RawModule) -> BundleResult<BoundModule> {
    fsops::ensure_dir(&settings.out_dir)?;

    let args = vec![
        "--out-dir".to_string(),
        settings.out_dir.display().to_string(),
        "--target".to_string(),
        "web".to_string(),
        raw.path.display().to_string(),
    ];

    let bindgen = settings.toolchain.wasm_bindgen.display().to_string();
    let output = runner
        .run(&bindgen, &args, Some(&settings.project_root))
        .map_err(|f| stage_failure(Stage::Bindgen, "wasm-bindgen", f))?;

    if !output.success() {
        return Err(BundleError::Bindgen {
            code: output.code,
            stderr: output.stderr,
        });
    }

    let module = expected_module(settings, raw);
    if !module.exists() {
        // A stale *_bg.wasm from an earlier differently-named build may sit
        // in the out-dir; never pick one of those up by scanning.
        return Err(BundleError::Bindgen {
            code: output.code,
            stderr: format!(
                "wasm-bindgen exited 0 but did not emit {}",
                module.display()
            ),
        });
    }

    Ok(BoundModule {
        out_dir: settings.out_dir.clone(),
        module,
    })
}

/// The generator names the re-emitted module `<stem>_bg.wasm`.
fn expected_module(settings: &Settings, raw: &RawModule) -> PathBuf {
    let stem = raw
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    settings.out_dir.join(format!("{stem}_bg.wasm"))
}
