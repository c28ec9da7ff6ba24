//! wasmbundle - build, bind, optimize and bundle Rust WebAssembly apps
//!
//! wasmbundle turns a Rust crate into a deployable static web bundle through
//! four sequential stages: cargo build for the wasm target, wasm-bindgen for
//! browser glue, wasm-opt for size, and a final merge of static assets and
//! the entry document into the output directory.

pub mod cli;
pub mod config;
pub mod error;
pub mod fsops;
pub mod lock;
pub mod pipeline;
pub mod report;
pub mod tool;

// Re-exports for convenience
pub use config::{Config, Overrides, Settings};
pub use error::{BundleError, BundleResult};
pub use pipeline::{BundleOutcome, BundlePipeline, Stage};
pub use report::{BundleEvent, EventSink, JsonEventSink, TextReporter};
pub use tool::{ToolRunner, Toolchain};
