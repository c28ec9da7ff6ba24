//! Compile stage: cargo build for the wasm target
//!
//! Produces the raw module at the conventional layout
//! `<target_dir>/<target>/<profile>/<bin_name>.wasm`. The cargo build cache
//! is an injected collaborator: this stage never creates or clears it beyond
//! what cargo itself does.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{BundleError, BundleResult};
use crate::pipeline::{stage_failure, Stage};
use crate::tool::ToolRunner;

/// Output of the compile stage: the untouched compiler artifact.
#[derive(Debug, Clone)]
pub struct RawModule {
    pub path: PathBuf,
    pub size: u64,
}

/// Name of the binary artifact, from config or the project manifest.
pub fn artifact_name(settings: &Settings) -> BundleResult<String> {
    if let Some(name) = &settings.bin_name {
        return Ok(name.clone());
    }
    let manifest = settings.project_root.join("Cargo.toml");
    package_name(&manifest)
}

fn package_name(manifest: &Path) -> BundleResult<String> {
    let content = std::fs::read_to_string(manifest).map_err(|e| BundleError::Manifest {
        manifest: manifest.to_path_buf(),
        message: e.to_string(),
    })?;
    let value: toml::Value = content.parse().map_err(|e: toml::de::Error| {
        BundleError::Manifest {
            manifest: manifest.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    value
        .get("package")
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str())
        .map(str::to_string)
        .ok_or_else(|| BundleError::Manifest {
            manifest: manifest.to_path_buf(),
            message: "no [package] name".to_string(),
        })
}

pub fn run(settings: &Settings, runner: &ToolRunner) -> BundleResult<RawModule> {
    let name = artifact_name(settings)?;

    let mut args = vec![
        "build".to_string(),
        "--target".to_string(),
        settings.target.clone(),
        "--target-dir".to_string(),
        settings.target_dir.display().to_string(),
    ];
    if settings.profile == "release" {
        args.push("--release".to_string());
    }

    let cargo = settings.toolchain.cargo.display().to_string();
    let output = runner
        .run(&cargo, &args, Some(&settings.project_root))
        .map_err(|f| stage_failure(Stage::Compile, "cargo", f))?;

    if !output.success() {
        return Err(BundleError::Compile {
            code: output.code,
            stderr: output.stderr,
        });
    }

    let path = settings
        .target_dir
        .join(&settings.target)
        .join(&settings.profile)
        .join(format!("{name}.wasm"));
    let size = std::fs::metadata(&path)
        .map_err(|_| BundleError::ArtifactMissing { path: path.clone() })?
        .len();

    Ok(RawModule { path, size })
}
