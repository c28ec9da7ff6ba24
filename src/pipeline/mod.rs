//! The staged build pipeline
//!
//! Four stages run strictly in order, each consuming the previous stage's
//! typed output:
//!
//! 1. compile  - cargo build for the wasm target
//! 2. bindgen  - wasm-bindgen emits JS glue + relocated module into out-dir
//! 3. optimize - wasm-opt rewrites the module in place (atomic replace)
//! 4. assets   - static asset tree + entry document merged into out-dir
//!
//! The first failure halts the run; nothing is retried and nothing already
//! written is rolled back. The output directory only ever accumulates files.

pub mod assets;
pub mod bindgen;
pub mod compile;
pub mod optimize;

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::error::{BundleError, BundleResult};
use crate::lock::RunLock;
use crate::report::{BundleEvent, EventSink};
use crate::tool::{RunFailure, ToolRunner};

/// One discrete, all-or-nothing step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Bindgen,
    Optimize,
    Assets,
}

impl Stage {
    /// Execution order. Asset merge deliberately runs last so a failed
    /// optimize never leaves an unoptimized module in a fully merged bundle.
    pub const ORDER: [Stage; 4] = [
        Stage::Compile,
        Stage::Bindgen,
        Stage::Optimize,
        Stage::Assets,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Compile => "compile",
            Stage::Bindgen => "bindgen",
            Stage::Optimize => "optimize",
            Stage::Assets => "assets",
        };
        f.write_str(name)
    }
}

/// Map a process-level failure to the owning stage's fatal error.
pub(crate) fn stage_failure(stage: Stage, tool: &str, failure: RunFailure) -> BundleError {
    match failure {
        RunFailure::Spawn { message } => BundleError::ToolMissing {
            tool: tool.to_string(),
            message,
        },
        RunFailure::Timeout { seconds } => BundleError::Timeout { stage, seconds },
        RunFailure::Cancelled => BundleError::Cancelled { stage },
    }
}

/// Final state of a successful run.
#[derive(Debug)]
pub struct BundleOutcome {
    pub out_dir: PathBuf,
    pub module: PathBuf,
    pub size_before: u64,
    pub size_after: u64,
}

/// Drives the four stages in order, emitting events along the way.
pub struct BundlePipeline<'a> {
    settings: &'a Settings,
    runner: ToolRunner,
    cancel: Arc<AtomicBool>,
    sink: &'a dyn EventSink,
}

impl<'a> BundlePipeline<'a> {
    pub fn new(settings: &'a Settings, cancel: Arc<AtomicBool>, sink: &'a dyn EventSink) -> Self {
        let runner = ToolRunner::new(cancel.clone(), settings.stage_timeout, false);
        Self {
            settings,
            runner,
            cancel,
            sink,
        }
    }

    /// Stream tool stderr live instead of only on failure (-v).
    pub fn with_echo(mut self) -> Self {
        self.runner = ToolRunner::new(self.cancel.clone(), self.settings.stage_timeout, true);
        self
    }

    fn check_cancelled(&self, stage: Stage) -> BundleResult<()> {
        if self.cancel.load(Ordering::SeqCst) {
            return Err(BundleError::Cancelled { stage });
        }
        Ok(())
    }

    /// Announce the failing stage before the error propagates, so sinks see
    /// which stage broke even when the caller handles the error itself.
    fn fail(&self, stage: Stage, err: BundleError) -> BundleError {
        self.sink.on_event(&BundleEvent::StageFailed {
            stage,
            message: err.to_string(),
        });
        err
    }

    /// Run the full pipeline. The run lock lives in the build cache so a
    /// compile failure still leaves the output directory untouched.
    pub fn run(&self) -> BundleResult<BundleOutcome> {
        let run_started = Instant::now();
        let _lock = RunLock::acquire(&self.settings.target_dir)?;
        self.sink.on_event(&BundleEvent::RunStarted {
            out_dir: self.settings.out_dir.clone(),
        });

        self.check_cancelled(Stage::Compile)?;
        self.sink.on_event(&BundleEvent::StageStarted {
            stage: Stage::Compile,
        });
        let started = Instant::now();
        let raw = compile::run(self.settings, &self.runner)
            .map_err(|e| self.fail(Stage::Compile, e))?;
        self.sink.on_event(&BundleEvent::Compiled {
            module: raw.path.clone(),
            size: raw.size,
            duration: started.elapsed(),
        });

        self.check_cancelled(Stage::Bindgen)?;
        self.sink.on_event(&BundleEvent::StageStarted {
            stage: Stage::Bindgen,
        });
        let started = Instant::now();
        let bound = bindgen::run(self.settings, &self.runner, &raw)
            .map_err(|e| self.fail(Stage::Bindgen, e))?;
        self.sink.on_event(&BundleEvent::Bound {
            module: bound.module.clone(),
            duration: started.elapsed(),
        });

        self.check_cancelled(Stage::Optimize)?;
        self.sink.on_event(&BundleEvent::StageStarted {
            stage: Stage::Optimize,
        });
        let started = Instant::now();
        let optimized = optimize::run(self.settings, &self.runner, &bound)
            .map_err(|e| self.fail(Stage::Optimize, e))?;
        self.sink.on_event(&BundleEvent::Optimized {
            module: optimized.module.clone(),
            size_before: optimized.size_before,
            size_after: optimized.size_after,
            duration: started.elapsed(),
        });

        self.check_cancelled(Stage::Assets)?;
        self.sink.on_event(&BundleEvent::StageStarted {
            stage: Stage::Assets,
        });
        let started = Instant::now();
        let merged =
            assets::run(self.settings, &bound).map_err(|e| self.fail(Stage::Assets, e))?;
        self.sink.on_event(&BundleEvent::AssetsMerged {
            entry: merged.entry.clone(),
            duration: started.elapsed(),
        });

        self.sink.on_event(&BundleEvent::RunCompleted {
            out_dir: self.settings.out_dir.clone(),
            duration: run_started.elapsed(),
        });
        Ok(BundleOutcome {
            out_dir: self.settings.out_dir.clone(),
            module: optimized.module,
            size_before: optimized.size_before,
            size_after: optimized.size_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::NullSink;

    #[test]
    fn stage_display_names() {
        let names: Vec<String> = Stage::ORDER.iter().map(Stage::to_string).collect();
        assert_eq!(names, vec!["compile", "bindgen", "optimize", "assets"]);
    }

    #[test]
    fn stage_failure_maps_timeout_to_owning_stage() {
        let err = stage_failure(
            Stage::Optimize,
            "wasm-opt",
            RunFailure::Timeout { seconds: 60 },
        );
        assert!(matches!(
            err,
            BundleError::Timeout {
                stage: Stage::Optimize,
                seconds: 60
            }
        ));
    }

    #[test]
    fn custom_sink_observes_which_stage_failed() {
        use std::sync::Mutex;

        struct Recorder(Mutex<Vec<BundleEvent>>);
        impl EventSink for Recorder {
            fn on_event(&self, event: &BundleEvent) {
                self.0.lock().unwrap().push(event.clone());
            }
        }

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"demo\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        let mut settings = crate::config::Settings::resolve(
            dir.path().to_path_buf(),
            crate::config::Overrides::default(),
            crate::config::Config::default(),
        )
        .unwrap();
        settings.toolchain.cargo = PathBuf::from("no-such-cargo-tool-4c1d");

        let recorder = Recorder(Mutex::new(Vec::new()));
        let pipeline = BundlePipeline::new(&settings, Arc::new(AtomicBool::new(false)), &recorder);
        let err = pipeline.run().unwrap_err();
        assert!(matches!(err, BundleError::ToolMissing { .. }));

        let events = recorder.0.into_inner().unwrap();
        let failed = events
            .iter()
            .find_map(|e| match e {
                BundleEvent::StageFailed { stage, message } => Some((*stage, message.clone())),
                _ => None,
            })
            .expect("sink never saw the failing stage");
        assert_eq!(failed.0, Stage::Compile);
        assert!(failed.1.contains("could not be run"), "{}", failed.1);
    }

    #[test]
    fn pipeline_stops_before_compile_when_already_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let settings = crate::config::Settings::resolve(
            dir.path().to_path_buf(),
            crate::config::Overrides::default(),
            crate::config::Config::default(),
        )
        .unwrap();

        let cancel = Arc::new(AtomicBool::new(true));
        let pipeline = BundlePipeline::new(&settings, cancel, &NullSink);
        let err = pipeline.run().unwrap_err();

        assert!(matches!(
            err,
            BundleError::Cancelled {
                stage: Stage::Compile
            }
        ));
        // Output directory invariant: never touched before bindgen.
        assert!(!settings.out_dir.exists());
    }
}
