//! Common test utilities for wasmbundle scenario tests.
//!
//! Provides `TestEnv`: an isolated temp project (manifest, assets, entry
//! document) plus a stub wasm toolchain injected through WASMBUNDLE_* env
//! vars, and a runner for the wasmbundle binary.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const RAW_MODULE: &[u8] = b"RAW-WASM-MODULE-0123456789";

/// Result of running the wasmbundle CLI
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Isolated project with a stub toolchain.
pub struct TestEnv {
    pub project_root: TempDir,
    bin_dir: PathBuf,
    wasmbundle_bin: PathBuf,
}

impl TestEnv {
    /// Project with a manifest, an asset tree (`assets/img/logo.png`,
    /// `assets/SF-Pro.ttf`), an `index.html` entry and working stub tools.
    pub fn new() -> Self {
        let project_root = TempDir::new().expect("create temp project");
        let root = project_root.path();

        fs::write(
            root.join("Cargo.toml"),
            "[package]\nname = \"demo\"\nversion = \"0.1.0\"\nedition = \"2021\"\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("assets").join("img")).unwrap();
        fs::write(root.join("assets").join("img").join("logo.png"), b"png-bytes").unwrap();
        fs::write(root.join("assets").join("SF-Pro.ttf"), b"font-bytes").unwrap();
        fs::write(root.join("index.html"), "<html><body>demo</body></html>").unwrap();

        let bin_dir = root.join("stub-bin");
        fs::create_dir_all(&bin_dir).unwrap();

        let env = Self {
            wasmbundle_bin: PathBuf::from(env!("CARGO_BIN_EXE_wasmbundle")),
            bin_dir,
            project_root,
        };
        env.stub_cargo_ok();
        env.stub_bindgen_ok();
        env.stub_wasm_opt_ok();
        env
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.project_root.path().join(relative)
    }

    pub fn out_dir(&self) -> PathBuf {
        self.path("dist")
    }

    pub fn raw_module(&self) -> PathBuf {
        self.path("target/wasm32-unknown-unknown/release/demo.wasm")
    }

    pub fn bundled_module(&self) -> PathBuf {
        self.out_dir().join("demo_bg.wasm")
    }

    fn write_stub(&self, name: &str, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        let path = self.bin_dir.join(name);
        fs::write(&path, body).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Stub compiler: places the raw module at the conventional cargo layout.
    pub fn stub_cargo_ok(&self) {
        self.write_stub(
            "cargo",
            r#"#!/bin/sh
target=""; tdir=""; profile="debug"
while [ $# -gt 0 ]; do
  case "$1" in
    --target) target="$2"; shift 2 ;;
    --target-dir) tdir="$2"; shift 2 ;;
    --release) profile="release"; shift ;;
    *) shift ;;
  esac
done
mkdir -p "$tdir/$target/$profile"
printf 'RAW-WASM-MODULE-0123456789' > "$tdir/$target/$profile/demo.wasm"
"#,
        );
    }

    /// Stub compiler that never exits (timeout scenarios).
    pub fn stub_cargo_hang(&self) {
        self.write_stub("cargo", "#!/bin/sh\nexec sleep 600\n");
    }

    /// Stub compiler that fails with a diagnostic on stderr.
    pub fn stub_cargo_fail(&self, diagnostic: &str) {
        self.write_stub(
            "cargo",
            &format!("#!/bin/sh\necho '{diagnostic}' >&2\nexit 101\n"),
        );
    }

    /// Stub binding generator: re-emits the module as `<stem>_bg.wasm` plus
    /// a JS glue file in the out-dir.
    pub fn stub_bindgen_ok(&self) {
        self.write_stub(
            "wasm-bindgen",
            r#"#!/bin/sh
out=""; in=""
while [ $# -gt 0 ]; do
  case "$1" in
    --out-dir) out="$2"; shift 2 ;;
    --target) shift 2 ;;
    *) in="$1"; shift ;;
  esac
done
mkdir -p "$out"
stem=$(basename "$in" .wasm)
{ cat "$in"; printf 'BOUND'; } > "$out/${stem}_bg.wasm"
printf 'export default function init() {}' > "$out/${stem}.js"
"#,
        );
    }

    pub fn stub_bindgen_fail(&self, diagnostic: &str) {
        self.write_stub(
            "wasm-bindgen",
            &format!("#!/bin/sh\necho '{diagnostic}' >&2\nexit 1\n"),
        );
    }

    /// Stub optimizer: keeps the first 8 bytes of the input, so the module
    /// always shrinks.
    pub fn stub_wasm_opt_ok(&self) {
        self.write_stub(
            "wasm-opt",
            r#"#!/bin/sh
out=""; in=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) in="$1"; shift ;;
  esac
done
head -c 8 "$in" > "$out"
"#,
        );
    }

    pub fn stub_wasm_opt_fail(&self, diagnostic: &str) {
        self.write_stub(
            "wasm-opt",
            &format!("#!/bin/sh\necho '{diagnostic}' >&2\nexit 1\n"),
        );
    }

    /// Run wasmbundle from the project root.
    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_from(self.project_root.path(), args)
    }

    /// Run wasmbundle from a specific directory.
    pub fn run_from(&self, cwd: &Path, args: &[&str]) -> TestResult {
        let output = Command::new(&self.wasmbundle_bin)
            .current_dir(cwd)
            .args(args)
            .env_remove("CARGO_TARGET_DIR")
            .env_remove("WASMBUNDLE_OUT_DIR")
            .env_remove("WASMBUNDLE_OPT_LEVEL")
            .env("WASMBUNDLE_NO_COLOR", "1")
            .env("WASMBUNDLE_CARGO", self.bin_dir.join("cargo"))
            .env("WASMBUNDLE_WASM_BINDGEN", self.bin_dir.join("wasm-bindgen"))
            .env("WASMBUNDLE_WASM_OPT", self.bin_dir.join("wasm-opt"))
            .output()
            .expect("Failed to execute wasmbundle");

        output_to_result(output)
    }

    /// Snapshot of all file names under a directory, relative, sorted.
    pub fn tree(&self, dir: &Path) -> Vec<String> {
        fn walk(base: &Path, dir: &Path, acc: &mut Vec<String>) {
            let Ok(entries) = fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(base, &path, acc);
                } else {
                    acc.push(
                        path.strip_prefix(base)
                            .unwrap()
                            .to_string_lossy()
                            .into_owned(),
                    );
                }
            }
        }
        let mut acc = Vec::new();
        walk(dir, dir, &mut acc);
        acc.sort();
        acc
    }
}

fn output_to_result(output: Output) -> TestResult {
    TestResult {
        success: output.status.success(),
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}
