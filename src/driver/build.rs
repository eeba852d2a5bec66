//! Building `libiui.a` and compiling conformance programs against it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

use crate::config::Config;
use crate::error::{HarnessError, Result};

use super::process::{run_with_timeout, ProcessOutcome};

/// Kconfig selection for the headless port with every module enabled.
pub const HEADLESS_CONFIG: &str = "\
CONFIG_CONFIGURED=y
CONFIG_PORT_HEADLESS=y
CONFIG_MODULE_BASIC=y
CONFIG_MODULE_INPUT=y
CONFIG_MODULE_CONTAINER=y
CONFIG_MODULE_LIST=y
CONFIG_MODULE_NAVIGATION=y
CONFIG_MODULE_OVERLAY=y
CONFIG_MODULE_SELECTION=y
CONFIG_MODULE_PICKER=y
CONFIG_MODULE_SEARCH=y
CONFIG_MODULE_ACTION=y
CONFIG_MODULE_MODAL=y
CONFIG_FEATURE_ICONS=y
";

const SANITIZER_FLAGS: [&str; 2] = ["-fsanitize=address,undefined", "-fno-omit-frame-pointer"];

/// Sanitizer flags when `<root>/.config` enables `CONFIG_SANITIZERS`.
/// An unreadable or missing file means no sanitizers.
pub fn sanitizer_flags(root: &Path) -> Vec<String> {
    match std::fs::read_to_string(root.join(".config")) {
        Ok(content) if content.contains("CONFIG_SANITIZERS=y") => {
            SANITIZER_FLAGS.iter().map(|flag| flag.to_string()).collect()
        }
        _ => Vec::new(),
    }
}

/// Write the headless `.config`, regenerate `iui_config.h` and run
/// `make libiui.a` in the project root.
pub async fn build_library(config: &Config) -> Result<PathBuf> {
    let root = &config.paths.root;
    tracing::info!(root = %root.display(), "building headless library");
    std::fs::write(root.join(".config"), HEADLESS_CONFIG)?;

    let mut genconfig = Command::new("python3");
    genconfig
        .args([
            "tools/kconfig/genconfig.py",
            "--header-path",
            "src/iui_config.h",
            "configs/Kconfig",
        ])
        .current_dir(root);
    run_build_step("genconfig", genconfig, config).await?;

    let mut make = Command::new("make");
    make.arg("-C").arg(root).arg("libiui.a");
    run_build_step("make", make, config).await?;

    let library = config.paths.library();
    tracing::info!(library = %library.display(), "build complete");
    Ok(library)
}

async fn run_build_step(step: &str, cmd: Command, config: &Config) -> Result<()> {
    let outcome = run_with_timeout(cmd, config.timeouts.build).await;
    step_result(step, outcome, config.timeouts.build)
}

fn step_result(step: &str, outcome: ProcessOutcome, limit: Duration) -> Result<()> {
    match outcome {
        ProcessOutcome::Completed(output) if output.status.success() => Ok(()),
        ProcessOutcome::Completed(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(HarnessError::build(format!(
                "{step} failed ({}): {}",
                output.status,
                stderr.trim()
            )))
        }
        ProcessOutcome::TimedOut => Err(HarnessError::build(format!(
            "{step} timed out after {limit:?}"
        ))),
        ProcessOutcome::SpawnFailed(err) => Err(HarnessError::build(format!(
            "failed to spawn {step}: {err}"
        ))),
        ProcessOutcome::WaitFailed(err) => Err(HarnessError::build(format!(
            "failed to wait for {step}: {err}"
        ))),
    }
}

/// Inputs for one conformance program compile.
#[derive(Debug, Clone)]
pub struct CompileRequest<'a> {
    pub source: &'a Path,
    pub output: &'a Path,
    /// Defines `IUI_MD3_RUNTIME_VALIDATION`.
    pub runtime_validation: bool,
    /// Inserted right after `<root>/include`.
    pub extra_includes: Vec<PathBuf>,
}

/// `<cc> -o <exe> <src> [-D..] -I.. <san> <lib> -lm <san>`
pub fn compile_command(
    compiler: &str,
    root: &Path,
    library: &Path,
    sanitizers: &[String],
    request: &CompileRequest<'_>,
) -> Command {
    let mut cmd = Command::new(compiler);
    cmd.arg("-o").arg(request.output).arg(request.source);
    if request.runtime_validation {
        cmd.arg("-DIUI_MD3_RUNTIME_VALIDATION");
    }
    cmd.arg(include_flag(&root.join("include")));
    for dir in &request.extra_includes {
        cmd.arg(include_flag(dir));
    }
    cmd.arg(include_flag(&root.join("src")))
        .arg(include_flag(root))
        .args(sanitizers)
        .arg(library)
        .arg("-lm")
        .args(sanitizers);
    cmd
}

fn include_flag(dir: &Path) -> String {
    format!("-I{}", dir.display())
}
