//! Error types for wasmbundle
//!
//! Uses `thiserror` for library errors. Each stage of the pipeline has its
//! own fatal variant carrying the external tool's diagnostic output verbatim,
//! since the tool's message is the only diagnostic available.

use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::Stage;

/// Result type alias for wasmbundle operations
pub type BundleResult<T> = Result<T, BundleError>;

/// Main error type for wasmbundle operations
#[derive(Error, Debug)]
pub enum BundleError {
    /// The native-to-wasm compiler exited nonzero
    #[error("compilation failed (exit code {code:?})\n{stderr}")]
    Compile { code: Option<i32>, stderr: String },

    /// The binding generator exited nonzero or produced no module
    #[error("binding generation failed (exit code {code:?})\n{stderr}")]
    Bindgen { code: Option<i32>, stderr: String },

    /// The size optimizer exited nonzero
    #[error("optimization failed (exit code {code:?})\n{stderr}")]
    Optimize { code: Option<i32>, stderr: String },

    /// Copying the asset tree or entry document failed
    #[error("asset copy failed for '{path}': {message}")]
    AssetCopy { path: PathBuf, message: String },

    /// A stage exceeded its configured timeout and its process was killed
    #[error("stage '{stage}' timed out after {seconds}s")]
    Timeout { stage: Stage, seconds: u64 },

    /// The run was cancelled (Ctrl+C) while a stage was in flight
    #[error("cancelled during stage '{stage}'")]
    Cancelled { stage: Stage },

    /// A required external tool could not be spawned
    #[error("tool '{tool}' could not be run: {message}")]
    ToolMissing { tool: String, message: String },

    /// Project manifest missing or unreadable
    #[error("could not read package name from {manifest}: {message}")]
    Manifest { manifest: PathBuf, message: String },

    /// Compiled module not found where the build layout says it should be
    #[error("expected wasm artifact at {path} after compilation - check bin_name/target settings")]
    ArtifactMissing { path: PathBuf },

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Another run holds the output directory lock
    #[error("output directory '{path}' is locked by another wasmbundle run")]
    OutputLocked { path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BundleError {
    /// Process exit code for this failure.
    ///
    /// Each stage gets a distinct code so CI can tell failures apart without
    /// parsing output. Cancellation uses the conventional SIGINT code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Compile { .. } => 10,
            Self::Bindgen { .. } => 11,
            Self::Optimize { .. } => 12,
            Self::AssetCopy { .. } => 13,
            Self::Timeout { .. } => 14,
            Self::Cancelled { .. } => 130,
            _ => 1,
        }
    }

    /// Captured diagnostic output of the failing tool, if a process was involved.
    pub fn tool_stderr(&self) -> Option<&str> {
        match self {
            Self::Compile { stderr, .. }
            | Self::Bindgen { stderr, .. }
            | Self::Optimize { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}
