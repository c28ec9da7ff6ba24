//! wasmbundle CLI
//!
//! Usage: wasmbundle [--target T] [--profile P] [--out-dir D] [--opt-level L]
//!                   [--assets-dir A] [--entry-file E]
//!
//! Runs the full compile -> bindgen -> optimize -> asset-merge pipeline and
//! exits nonzero on the first failing stage (distinct code per stage).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use wasmbundle::cli::Cli;
use wasmbundle::config::{Config, Settings, DEFAULT_CONFIG_FILE};
use wasmbundle::report::{BundleEvent, EventSink, JsonEventSink, TextReporter};
use wasmbundle::{BundleError, BundlePipeline};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let project_root = cli.project_root.clone();
    let config_path = match &cli.config {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => project_root.join(path),
        None => project_root.join(DEFAULT_CONFIG_FILE),
    };
    let (config, warnings) = match Config::load_or_default(&config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {}: {e}", config_path.display());
            std::process::exit(e.exit_code());
        }
    };
    let config = config.with_env_overrides();

    let settings = match Settings::resolve(project_root, cli.overrides(), config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    let sink: Box<dyn EventSink> = if cli.json {
        Box::new(JsonEventSink::stdout())
    } else {
        Box::new(TextReporter::auto(cli.verbose))
    };
    for warning in &warnings {
        sink.on_event(&BundleEvent::ConfigWarning {
            key: warning.key.clone(),
        });
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_flag = cancel.clone();
    ctrlc::set_handler(move || {
        cancel_flag.store(true, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let mut pipeline = BundlePipeline::new(&settings, cancel, sink.as_ref());
    if cli.verbose > 0 {
        pipeline = pipeline.with_echo();
    }

    match pipeline.run() {
        Ok(_) => Ok(()),
        Err(e) => {
            report_failure(&e, cli.json);
            std::process::exit(e.exit_code());
        }
    }
}

/// Surface the failure, keeping the failing tool's own message verbatim -
/// the pipeline does no validation of its own, so that message is the only
/// diagnostic there is.
fn report_failure(e: &BundleError, json: bool) {
    if json {
        let payload = serde_json::json!({
            "event": "error",
            "message": e.to_string(),
            "exit_code": e.exit_code(),
            "success": false,
        });
        println!("{payload}");
    } else {
        eprintln!("error: {e}");
    }
}
