use std::path::PathBuf;

use clap::Parser;

/// wasmbundle - build, bind, optimize and bundle a Rust wasm app
///
/// Runs four stages in order: cargo build (wasm target), wasm-bindgen,
/// wasm-opt, then merges static assets and the entry document into the
/// output directory. The first failing stage halts the run.
#[derive(Parser, Debug)]
#[command(name = "wasmbundle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Compilation target triple [default: wasm32-unknown-unknown]
    #[arg(long)]
    pub target: Option<String>,

    /// Build profile: release or debug [default: release]
    #[arg(long)]
    pub profile: Option<String>,

    /// Output directory for the deployable bundle [default: dist]
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// wasm-opt level: 0-4, s or z [default: z]
    #[arg(long)]
    pub opt_level: Option<String>,

    /// Static asset tree copied to <out-dir>/assets [default: assets]
    #[arg(long)]
    pub assets_dir: Option<PathBuf>,

    /// Entry document copied into the output directory [default: index.html]
    #[arg(long)]
    pub entry_file: Option<PathBuf>,

    /// Project root containing Cargo.toml [default: .]
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,

    /// Config file path, relative to the project root [default: wasmbundle.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output NDJSON events for CI
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl Cli {
    /// Pipeline-setting overrides carried by the flags.
    pub fn overrides(&self) -> crate::config::Overrides {
        crate::config::Overrides {
            target: self.target.clone(),
            profile: self.profile.clone(),
            out_dir: self.out_dir.clone(),
            opt_level: self.opt_level.clone(),
            assets_dir: self.assets_dir.clone(),
            entry_file: self.entry_file.clone(),
        }
    }
}
