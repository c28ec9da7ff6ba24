//! Configuration module for wasmbundle
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (WASMBUNDLE_*)
//! 3. Project config (wasmbundle.toml)
//! 4. Built-in defaults (lowest priority)
//!
//! Unknown keys in the config file warn but never fail the run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{BundleError, BundleResult};
use crate::tool::Toolchain;

pub const DEFAULT_TARGET: &str = "wasm32-unknown-unknown";
pub const DEFAULT_PROFILE: &str = "release";
pub const DEFAULT_OUT_DIR: &str = "dist";
pub const DEFAULT_OPT_LEVEL: &str = "z";
pub const DEFAULT_ASSETS_DIR: &str = "assets";
pub const DEFAULT_ENTRY_FILE: &str = "index.html";
pub const DEFAULT_CONFIG_FILE: &str = "wasmbundle.toml";

/// `[build]` table of wasmbundle.toml
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BuildConfig {
    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub profile: Option<String>,

    #[serde(default)]
    pub out_dir: Option<PathBuf>,

    #[serde(default)]
    pub opt_level: Option<String>,

    #[serde(default)]
    pub assets_dir: Option<PathBuf>,

    #[serde(default)]
    pub entry_file: Option<PathBuf>,

    /// Binary artifact name; defaults to the `[package]` name in Cargo.toml
    #[serde(default)]
    pub bin_name: Option<String>,

    /// Cargo build cache root; defaults to $CARGO_TARGET_DIR or "target"
    #[serde(default)]
    pub target_dir: Option<PathBuf>,

    /// Per-stage timeout in seconds; absent means wait forever
    #[serde(default)]
    pub stage_timeout_secs: Option<u64>,
}

/// `[tools]` table: external tool binaries
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ToolsConfig {
    #[serde(default)]
    pub cargo: Option<PathBuf>,

    #[serde(default)]
    pub wasm_bindgen: Option<PathBuf>,

    #[serde(default)]
    pub wasm_opt: Option<PathBuf>,
}

/// Parsed wasmbundle.toml
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Warning about an unrecognized configuration key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
}

impl Config {
    /// Load configuration from a TOML file, collecting unknown-key warnings.
    pub fn load_with_warnings(path: &Path) -> BundleResult<(Self, Vec<ConfigWarning>)> {
        let content = std::fs::read_to_string(path)?;
        let mut warnings = Vec::new();
        let deserializer = toml::de::Deserializer::new(&content);
        let config: Self = serde_ignored::deserialize(deserializer, |key| {
            warnings.push(ConfigWarning {
                key: key.to_string(),
            });
        })?;
        Ok((config, warnings))
    }

    /// Load the project config if present, defaults otherwise. A file that
    /// exists but does not parse is fatal - a typo'd config silently falling
    /// back to defaults would redirect the whole run.
    pub fn load_or_default(path: &Path) -> BundleResult<(Self, Vec<ConfigWarning>)> {
        if path.exists() {
            Self::load_with_warnings(path)
        } else {
            Ok((Self::default(), Vec::new()))
        }
    }

    /// Apply WASMBUNDLE_* environment variable overrides.
    pub fn with_env_overrides(mut self) -> Self {
        fn env(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        }

        if let Some(v) = env("WASMBUNDLE_TARGET") {
            self.build.target = Some(v);
        }
        if let Some(v) = env("WASMBUNDLE_PROFILE") {
            self.build.profile = Some(v);
        }
        if let Some(v) = env("WASMBUNDLE_OUT_DIR") {
            self.build.out_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = env("WASMBUNDLE_OPT_LEVEL") {
            self.build.opt_level = Some(v);
        }
        if let Some(v) = env("WASMBUNDLE_ASSETS_DIR") {
            self.build.assets_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = env("WASMBUNDLE_ENTRY_FILE") {
            self.build.entry_file = Some(PathBuf::from(v));
        }
        if let Some(v) = env("WASMBUNDLE_BIN_NAME") {
            self.build.bin_name = Some(v);
        }
        if let Some(v) = env("WASMBUNDLE_TARGET_DIR") {
            self.build.target_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = env("WASMBUNDLE_STAGE_TIMEOUT_SECS") {
            if let Ok(secs) = v.parse() {
                self.build.stage_timeout_secs = Some(secs);
            }
        }
        if let Some(v) = env("WASMBUNDLE_CARGO") {
            self.tools.cargo = Some(PathBuf::from(v));
        }
        if let Some(v) = env("WASMBUNDLE_WASM_BINDGEN") {
            self.tools.wasm_bindgen = Some(PathBuf::from(v));
        }
        if let Some(v) = env("WASMBUNDLE_WASM_OPT") {
            self.tools.wasm_opt = Some(PathBuf::from(v));
        }
        self
    }
}

/// CLI-facing knobs that feed into [`Settings`]. Fields left `None` fall
/// through to env/config/defaults.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub target: Option<String>,
    pub profile: Option<String>,
    pub out_dir: Option<PathBuf>,
    pub opt_level: Option<String>,
    pub assets_dir: Option<PathBuf>,
    pub entry_file: Option<PathBuf>,
}

/// Fully resolved settings for one pipeline run. All paths are anchored at
/// the project root.
#[derive(Debug, Clone)]
pub struct Settings {
    pub project_root: PathBuf,
    pub target: String,
    pub profile: String,
    pub out_dir: PathBuf,
    pub opt_level: String,
    pub assets_dir: PathBuf,
    pub entry_file: PathBuf,
    pub bin_name: Option<String>,
    pub target_dir: PathBuf,
    pub stage_timeout: Option<Duration>,
    pub toolchain: Toolchain,
}

impl Settings {
    /// Merge CLI overrides, config (already env-overridden) and defaults.
    pub fn resolve(
        project_root: PathBuf,
        overrides: Overrides,
        config: Config,
    ) -> BundleResult<Self> {
        let anchor = |p: PathBuf| -> PathBuf {
            if p.is_absolute() {
                p
            } else {
                project_root.join(p)
            }
        };

        let target = overrides
            .target
            .or(config.build.target)
            .unwrap_or_else(|| DEFAULT_TARGET.to_string());
        let profile = overrides
            .profile
            .or(config.build.profile)
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        if profile != "release" && profile != "debug" {
            return Err(BundleError::Config(format!(
                "unknown profile '{profile}' (expected 'release' or 'debug')"
            )));
        }

        let opt_level = overrides
            .opt_level
            .or(config.build.opt_level)
            .unwrap_or_else(|| DEFAULT_OPT_LEVEL.to_string());
        validate_opt_level(&opt_level)?;

        let out_dir = anchor(
            overrides
                .out_dir
                .or(config.build.out_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)),
        );
        let assets_dir = anchor(
            overrides
                .assets_dir
                .or(config.build.assets_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR)),
        );
        let entry_file = anchor(
            overrides
                .entry_file
                .or(config.build.entry_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ENTRY_FILE)),
        );
        let target_dir = anchor(
            config
                .build
                .target_dir
                .or_else(|| std::env::var_os("CARGO_TARGET_DIR").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("target")),
        );

        let toolchain = Toolchain {
            cargo: config.tools.cargo.unwrap_or_else(|| PathBuf::from("cargo")),
            wasm_bindgen: config
                .tools
                .wasm_bindgen
                .unwrap_or_else(|| PathBuf::from("wasm-bindgen")),
            wasm_opt: config
                .tools
                .wasm_opt
                .unwrap_or_else(|| PathBuf::from("wasm-opt")),
        };

        Ok(Self {
            project_root,
            target,
            profile,
            out_dir,
            opt_level,
            assets_dir,
            entry_file,
            bin_name: config.build.bin_name,
            target_dir,
            stage_timeout: config.build.stage_timeout_secs.map(Duration::from_secs),
            toolchain,
        })
    }
}

/// Accepts the levels `wasm-opt` understands: 0-4, s, z.
pub fn validate_opt_level(level: &str) -> BundleResult<()> {
    match level {
        "0" | "1" | "2" | "3" | "4" | "s" | "z" => Ok(()),
        other => Err(BundleError::Config(format!(
            "unknown opt level '{other}' (expected one of 0, 1, 2, 3, 4, s, z)"
        ))),
    }
}
