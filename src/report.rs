//! Progress reporting
//!
//! The pipeline emits [`BundleEvent`]s; a sink renders them either as
//! human-readable text or as NDJSON for CI consumption.

use std::io::{self, Write};

use is_terminal::IsTerminal;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use crate::pipeline::Stage;

/// One observable step of a pipeline run.
#[derive(Debug, Clone)]
pub enum BundleEvent {
    RunStarted {
        out_dir: PathBuf,
    },
    ConfigWarning {
        key: String,
    },
    StageStarted {
        stage: Stage,
    },
    Compiled {
        module: PathBuf,
        size: u64,
        duration: Duration,
    },
    Bound {
        module: PathBuf,
        duration: Duration,
    },
    Optimized {
        module: PathBuf,
        size_before: u64,
        size_after: u64,
        duration: Duration,
    },
    AssetsMerged {
        entry: PathBuf,
        duration: Duration,
    },
    StageFailed {
        stage: Stage,
        message: String,
    },
    RunCompleted {
        out_dir: PathBuf,
        duration: Duration,
    },
}

/// Receives pipeline events as they happen.
pub trait EventSink {
    fn on_event(&self, event: &BundleEvent);
}

struct Icons {
    check: &'static str,
    cross: &'static str,
    arrow: &'static str,
}

impl Icons {
    fn unicode() -> Self {
        Self {
            check: "✓",
            cross: "✗",
            arrow: "→",
        }
    }

    fn ascii() -> Self {
        Self {
            check: "[OK]",
            cross: "[FAIL]",
            arrow: "->",
        }
    }
}

/// Human-readable reporter writing to stdout.
pub struct TextReporter {
    pub color: bool,
    pub unicode: bool,
    pub verbose: u8,
}

impl TextReporter {
    /// Detect terminal capabilities, honoring WASMBUNDLE_NO_COLOR.
    pub fn auto(verbose: u8) -> Self {
        let tty = io::stdout().is_terminal();
        let no_color = std::env::var_os("WASMBUNDLE_NO_COLOR").is_some();
        Self {
            color: tty && !no_color,
            unicode: tty,
            verbose,
        }
    }

    fn green(&self, s: &str) -> String {
        if self.color {
            format!("\x1b[32m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }

    fn red(&self, s: &str) -> String {
        if self.color {
            format!("\x1b[31m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }
}

impl EventSink for TextReporter {
    fn on_event(&self, event: &BundleEvent) {
        let icons = if self.unicode {
            Icons::unicode()
        } else {
            Icons::ascii()
        };
        match event {
            BundleEvent::RunStarted { out_dir } => {
                println!("Bundling {} {}", icons.arrow, out_dir.display());
            }
            BundleEvent::ConfigWarning { key } => {
                eprintln!("warning: unknown config key '{key}'");
            }
            BundleEvent::StageStarted { stage } => {
                if self.verbose > 0 {
                    println!("  {stage}...");
                }
            }
            BundleEvent::Compiled {
                module,
                size,
                duration,
            } => {
                println!(
                    "{} compile ({:.1}s, {} bytes)",
                    self.green(icons.check),
                    duration.as_secs_f64(),
                    size
                );
                if self.verbose > 0 {
                    println!("  {}", module.display());
                }
            }
            BundleEvent::Bound { module, duration } => {
                println!(
                    "{} bindgen ({:.1}s)",
                    self.green(icons.check),
                    duration.as_secs_f64()
                );
                if self.verbose > 0 {
                    println!("  {}", module.display());
                }
            }
            BundleEvent::Optimized {
                size_before,
                size_after,
                duration,
                ..
            } => {
                println!(
                    "{} optimize ({:.1}s, {} {} {} bytes)",
                    self.green(icons.check),
                    duration.as_secs_f64(),
                    size_before,
                    icons.arrow,
                    size_after
                );
            }
            BundleEvent::AssetsMerged { entry, duration } => {
                println!(
                    "{} assets ({:.1}s, entry {})",
                    self.green(icons.check),
                    duration.as_secs_f64(),
                    entry.display()
                );
            }
            BundleEvent::StageFailed { stage, .. } => {
                // The failure message itself goes through the error path, so
                // only mark which stage broke here.
                eprintln!("{} {stage} failed", self.red(icons.cross));
            }
            BundleEvent::RunCompleted { out_dir, duration } => {
                println!(
                    "{} bundle ready in {} ({:.1}s)",
                    self.green(icons.check),
                    out_dir.display(),
                    duration.as_secs_f64()
                );
            }
        }
    }
}

/// Event sink that outputs NDJSON events to stdout.
pub struct JsonEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventSink {
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Sink writing to a custom writer (for testing).
    #[allow(dead_code)]
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    fn write_event(&self, event: serde_json::Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{event}");
            let _ = writer.flush();
        }
    }
}

impl EventSink for JsonEventSink {
    fn on_event(&self, event: &BundleEvent) {
        let json = match event {
            BundleEvent::RunStarted { out_dir } => serde_json::json!({
                "event": "start",
                "out_dir": out_dir.display().to_string(),
            }),
            BundleEvent::ConfigWarning { key } => serde_json::json!({
                "event": "config_warning",
                "key": key,
            }),
            BundleEvent::StageStarted { stage } => serde_json::json!({
                "event": "stage_start",
                "stage": stage.to_string(),
            }),
            BundleEvent::Compiled {
                module,
                size,
                duration,
            } => serde_json::json!({
                "event": "stage_ok",
                "stage": "compile",
                "module": module.display().to_string(),
                "size": size,
                "duration_ms": duration.as_millis() as u64,
            }),
            BundleEvent::Bound { module, duration } => serde_json::json!({
                "event": "stage_ok",
                "stage": "bindgen",
                "module": module.display().to_string(),
                "duration_ms": duration.as_millis() as u64,
            }),
            BundleEvent::Optimized {
                module,
                size_before,
                size_after,
                duration,
            } => serde_json::json!({
                "event": "stage_ok",
                "stage": "optimize",
                "module": module.display().to_string(),
                "size_before": size_before,
                "size_after": size_after,
                "duration_ms": duration.as_millis() as u64,
            }),
            BundleEvent::AssetsMerged { entry, duration } => serde_json::json!({
                "event": "stage_ok",
                "stage": "assets",
                "entry": entry.display().to_string(),
                "duration_ms": duration.as_millis() as u64,
            }),
            BundleEvent::StageFailed { stage, message } => serde_json::json!({
                "event": "stage_failed",
                "stage": stage.to_string(),
                "message": message,
            }),
            BundleEvent::RunCompleted { out_dir, duration } => serde_json::json!({
                "event": "done",
                "out_dir": out_dir.display().to_string(),
                "duration_ms": duration.as_millis() as u64,
                "success": true,
            }),
        };
        self.write_event(json);
    }
}

/// Sink that swallows everything (library callers that bring their own UI).
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&self, _event: &BundleEvent) {}
}
