//! Conformance driver: synthesizes C programs, compiles them against the
//! widget library, runs them under a timeout and classifies the result.
//!
//! Every public entry point returns a [`CaseOutcome`]; nothing inside a case
//! aborts the run. Cases execute strictly one at a time.

pub mod build;
pub mod cases;
pub mod process;
pub mod protocol;
pub mod template;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Output;

use serde_json::json;
use tokio::process::Command;

use crate::compare::{compare, write_diff_heatmap};
use crate::compliance::{generate_checks, parse_report, GenerationStatus, InvariantTable};
use crate::config::Config;
use crate::raster::decode_file;
use crate::types::{CaseOutcome, CaseState, CompareMode, FailureKind};

use build::{compile_command, sanitizer_flags, CompileRequest};
use cases::TestCase;
use process::{run_with_timeout, ProcessOutcome};
use protocol::StdoutRecord;

/// What a visual run does with the screenshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisualMode {
    /// Copy the screenshot into the golden store.
    Generate,
    Compare { tolerance: u8, mode: CompareMode },
}

/// A synthesized program ready to be written, compiled and run.
struct Program<'a> {
    /// Files are named `test_<stem>.c` and `test_<stem>`.
    stem: &'a str,
    source: &'a str,
    runtime_validation: bool,
    extra_includes: Vec<PathBuf>,
}

enum Execution {
    Finished(CaseOutcome, Output),
    Stopped(CaseOutcome),
}

pub struct Driver {
    config: Config,
    library: PathBuf,
    sanitizers: Vec<String>,
}

impl Driver {
    pub fn new(config: Config) -> Self {
        let library = config.paths.library();
        let sanitizers = sanitizer_flags(&config.paths.root);
        if !sanitizers.is_empty() {
            tracing::debug!(?sanitizers, "sanitizers enabled by .config");
        }
        Self {
            config,
            library,
            sanitizers,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn library(&self) -> &Path {
        &self.library
    }

    fn build_dir(&self) -> PathBuf {
        self.config.paths.build_dir()
    }

    fn screenshot_path(&self, name: &str) -> PathBuf {
        self.build_dir().join(format!("{name}.png"))
    }

    /// Compile and run one unified case.
    pub async fn run_case(&self, name: &str, screenshot: bool) -> CaseOutcome {
        let Some(case) = cases::find(name) else {
            return CaseOutcome::new(name, name).fail(FailureKind::UnknownCase);
        };
        let outcome = self.exercise(case, screenshot).await;
        if outcome.state == CaseState::Ran {
            outcome.pass()
        } else {
            outcome
        }
    }

    /// Run a case with a screenshot, then either store it as the golden image
    /// or compare it against the stored one.
    pub async fn run_visual(&self, name: &str, mode: VisualMode) -> CaseOutcome {
        let Some(case) = cases::find(name) else {
            return CaseOutcome::new(name, name).fail(FailureKind::UnknownCase);
        };
        let golden_dir = self.config.paths.golden_dir();
        let mut outcome = self.exercise(case, true).await;
        outcome.description = match mode {
            VisualMode::Generate => format!("Generate {name}"),
            VisualMode::Compare { .. } => format!("Visual: {name}"),
        };
        if outcome.state != CaseState::Ran {
            return outcome;
        }

        let screenshot = self.screenshot_path(name);
        if !screenshot.is_file() {
            return outcome.fail(FailureKind::NoScreenshot);
        }
        let golden = golden_dir.join(format!("{name}.png"));

        match mode {
            VisualMode::Generate => {
                let copied = std::fs::create_dir_all(&golden_dir)
                    .and_then(|_| std::fs::copy(&screenshot, &golden));
                if let Err(err) = copied {
                    return outcome.fail(FailureKind::Io {
                        message: format!("copy to {}: {err}", golden.display()),
                    });
                }
                outcome.description = format!("Generated {name}.png");
                outcome
                    .with_info("action", "generated")
                    .with_info("path", golden.display().to_string())
                    .pass()
            }
            VisualMode::Compare { tolerance, mode } => {
                if !golden.is_file() {
                    let file = golden
                        .file_name()
                        .map(|f| f.to_string_lossy().into_owned())
                        .unwrap_or_else(|| golden.display().to_string());
                    return outcome.fail(FailureKind::NoBaseline { path: file });
                }
                let decoded = decode_file(&screenshot)
                    .and_then(|current| decode_file(&golden).map(|baseline| (current, baseline)));
                let (current, baseline) = match decoded {
                    Ok(pair) => pair,
                    Err(err) => {
                        return outcome.fail(FailureKind::Decode {
                            reason: err.to_string(),
                        })
                    }
                };

                let result = compare(&current, &baseline, tolerance);
                let outcome = outcome
                    .with_info("similarity", result.similarity_percent)
                    .with_info("diffPixels", result.differing_pixels);
                if result.passes(mode) {
                    return outcome.pass();
                }

                tracing::debug!(
                    case = name,
                    similarity = result.similarity_percent,
                    differing = result.differing_pixels,
                    "visual mismatch"
                );
                let diff_path = self.build_dir().join(format!("{name}.diff.png"));
                let outcome = match write_diff_heatmap(&current, &baseline, tolerance, &diff_path) {
                    Ok(()) => outcome.with_info("diffImage", diff_path.display().to_string()),
                    Err(err) => {
                        tracing::warn!(case = name, error = %err, "failed to write diff heatmap");
                        outcome
                    }
                };
                outcome.fail(FailureKind::BaselineMismatch {
                    similarity_percent: result.similarity_percent,
                    differing_pixels: result.differing_pixels,
                })
            }
        }
    }

    /// Parse the DSL, emit checks for every property that agrees with the
    /// invariant table, then compile and run the compliance program.
    pub async fn run_spec_compliance(&self, dsl_path: &Path) -> CaseOutcome {
        let outcome = CaseOutcome::new("md3-spec", "MD3 Spec Validation");
        let text = match std::fs::read_to_string(dsl_path) {
            Ok(text) => text,
            Err(err) => {
                return outcome.fail(FailureKind::Io {
                    message: format!("spec file {}: {err}", dsl_path.display()),
                })
            }
        };

        let doc = crate::dsl::parse(&text);
        let generated = generate_checks(&doc, &InvariantTable::md3());
        tracing::debug!(
            components = doc.components.len(),
            ignored_lines = doc.ignored_lines,
            checks = generated.checks.len(),
            skipped = generated.skipped.len(),
            "generated compliance checks"
        );
        let outcome = outcome.with_info("skipped", generated.skipped.len() as u64);
        match generated.status() {
            GenerationStatus::Ready(_) => {}
            GenerationStatus::EmptyDocument => {
                return outcome
                    .with_info("status", "empty-document")
                    .fail(FailureKind::NoChecks)
            }
            GenerationStatus::NothingToCheck => {
                return outcome
                    .with_info("status", "nothing-to-check")
                    .fail(FailureKind::NoChecks)
            }
        }

        let source = template::compliance_source(&generated.checks);
        let program = Program {
            stem: "md3_spec",
            source: &source,
            runtime_validation: false,
            extra_includes: Vec::new(),
        };
        let (mut outcome, output) = match self.build_and_run(outcome, &program, &[]).await {
            Execution::Finished(outcome, output) => (outcome, output),
            Execution::Stopped(outcome) => return outcome,
        };

        let report = parse_report(&String::from_utf8_lossy(&output.stdout));
        for name in &report.failed {
            tracing::warn!(check = %name, "compliance check failed");
        }
        let failures = report.failure_count();
        outcome.description = format!("MD3 Spec Validation ({} checks)", report.ok.len());
        let outcome = outcome
            .with_info("ok", report.ok.len() as u64)
            .with_info("fail", failures)
            .with_info("failed", json!(report.failed));

        if failures > 0 {
            outcome.fail(FailureKind::Violations { count: failures })
        } else if !output.status.success() {
            outcome.fail(FailureKind::Runtime {
                exit_code: output.status.code(),
            })
        } else {
            outcome.pass()
        }
    }

    /// Render a fixed widget set with runtime tracking enabled. Violations are
    /// reported but only a failure to build or run fails the case.
    pub async fn run_runtime_validation(&self) -> CaseOutcome {
        let outcome = CaseOutcome::new("md3-runtime", "MD3 Runtime Validation");
        let mut extra_includes = Vec::new();
        if let Some(parent) = self.library.parent().filter(|p| !p.as_os_str().is_empty()) {
            extra_includes.push(parent.to_path_buf());
        }
        let program = Program {
            stem: "md3_runtime",
            source: template::runtime_source(),
            runtime_validation: true,
            extra_includes,
        };
        let (mut outcome, output) = match self.build_and_run(outcome, &program, &[]).await {
            Execution::Finished(outcome, output) => (outcome, output),
            Execution::Stopped(outcome) => return outcome,
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let record = StdoutRecord::parse(&stdout);
        let tracked = record.echo_number("tracked").unwrap_or(0.0) as u64;
        let violations = record.echo_number("violations").unwrap_or(0.0) as u64;
        let details: Vec<&str> = stdout
            .lines()
            .filter(|line| line.contains("VIOLATION:"))
            .map(str::trim)
            .collect();
        for line in &details {
            tracing::info!("{line}");
        }

        outcome.description = format!("MD3 Runtime Validation ({tracked} widgets)");
        let mut outcome = outcome
            .with_info("tracked", tracked)
            .with_info("violations", violations);
        if !details.is_empty() {
            outcome = outcome.with_info("details", json!(details));
        }
        outcome.pass()
    }

    /// Shared-memory self test. Passes iff the program exits cleanly and
    /// every reported sub-test passed.
    pub async fn run_ipc_smoke(&self) -> CaseOutcome {
        let outcome = CaseOutcome::new("shm-ipc", "SHM IPC");
        let program = Program {
            stem: "shm_self",
            source: template::ipc_smoke_source(),
            runtime_validation: false,
            extra_includes: Vec::new(),
        };
        let (mut outcome, output) = match self.build_and_run(outcome, &program, &[]).await {
            Execution::Finished(outcome, output) => (outcome, output),
            Execution::Stopped(outcome) => return outcome,
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let tests = parse_self_test_lines(&stdout);
        let passed = tests.iter().filter(|(_, ok)| *ok).count() as u64;
        let total = tests.len() as u64;

        outcome.description = format!("SHM IPC ({passed} checks)");
        let outcome = outcome
            .with_info("passed", passed)
            .with_info("total", total)
            .with_info("tests", json!(tests));

        if passed < total {
            outcome.fail(FailureKind::Violations {
                count: total - passed,
            })
        } else if !output.status.success() {
            outcome.fail(FailureKind::Runtime {
                exit_code: output.status.code(),
            })
        } else {
            outcome.pass()
        }
    }

    /// Build and run a unified case. Returns a `Ran` outcome when every
    /// check passed, so callers decide the verdict.
    async fn exercise(&self, case: &TestCase, screenshot: bool) -> CaseOutcome {
        let outcome = CaseOutcome::new(case.name, case.description);
        let source = template::unified_source(case);
        let program = Program {
            stem: case.name,
            source: &source,
            runtime_validation: true,
            extra_includes: Vec::new(),
        };
        let args: Vec<OsString> = if screenshot {
            let path = self.screenshot_path(case.name);
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "removed stale screenshot"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    return outcome.fail(FailureKind::Io {
                        message: format!("remove {}: {err}", path.display()),
                    })
                }
            }
            vec![path.into_os_string()]
        } else {
            Vec::new()
        };

        let (outcome, output) = match self.build_and_run(outcome, &program, &args).await {
            Execution::Finished(outcome, output) => (outcome, output),
            Execution::Stopped(outcome) => return outcome,
        };

        let record = StdoutRecord::parse(&String::from_utf8_lossy(&output.stdout));
        let mut outcome = outcome
            .with_info("frames", record.frames)
            .with_info("box", record.box_calls)
            .with_info("passed", record.passed);
        for (key, value) in &record.echoes {
            outcome = outcome.with_info(key, value.as_str());
        }
        if let Some(saved) = &record.saved {
            outcome = outcome.with_info("saved", saved.as_str());
        }

        if !output.status.success() {
            return outcome.fail(FailureKind::Runtime {
                exit_code: output.status.code(),
            });
        }
        if record.box_calls < case.min_box_calls {
            return outcome.fail(FailureKind::DrawCalls {
                observed: record.box_calls,
                minimum: case.min_box_calls,
            });
        }
        if !record.reported_pass() {
            return outcome.fail(FailureKind::Runtime {
                exit_code: output.status.code(),
            });
        }
        outcome
    }

    /// Write, compile and run `program`. On success the outcome is `Ran`.
    async fn build_and_run(
        &self,
        mut outcome: CaseOutcome,
        program: &Program<'_>,
        args: &[OsString],
    ) -> Execution {
        if !self.library.is_file() {
            return Execution::Stopped(outcome.fail(FailureKind::LibraryMissing {
                path: self.library.display().to_string(),
            }));
        }

        let build_dir = self.build_dir();
        let source_path = build_dir.join(format!("test_{}.c", program.stem));
        let exe_path = build_dir.join(format!("test_{}", program.stem));
        let written = std::fs::create_dir_all(&build_dir)
            .and_then(|_| std::fs::write(&source_path, program.source));
        if let Err(err) = written {
            return Execution::Stopped(outcome.fail(FailureKind::Io {
                message: format!("write {}: {err}", source_path.display()),
            }));
        }

        let request = CompileRequest {
            source: &source_path,
            output: &exe_path,
            runtime_validation: program.runtime_validation,
            extra_includes: program.extra_includes.clone(),
        };
        let compile = compile_command(
            &self.config.compiler,
            &self.config.paths.root,
            &self.library,
            &self.sanitizers,
            &request,
        );
        match run_with_timeout(compile, self.config.timeouts.build).await {
            ProcessOutcome::Completed(output) if output.status.success() => {
                outcome.advance(CaseState::Built);
            }
            ProcessOutcome::Completed(output) => {
                outcome.advance(CaseState::BuildFailed);
                return Execution::Stopped(outcome.fail(FailureKind::Build {
                    diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
                }));
            }
            ProcessOutcome::TimedOut => {
                outcome.advance(CaseState::BuildFailed);
                return Execution::Stopped(outcome.fail(FailureKind::Build {
                    diagnostics: format!(
                        "compiler timed out after {:?}",
                        self.config.timeouts.build
                    ),
                }));
            }
            ProcessOutcome::SpawnFailed(err) => {
                return Execution::Stopped(outcome.fail(FailureKind::Spawn {
                    message: format!("{}: {err}", self.config.compiler),
                }));
            }
            ProcessOutcome::WaitFailed(err) => {
                return Execution::Stopped(outcome.fail(FailureKind::Io {
                    message: format!("wait for {}: {err}", self.config.compiler),
                }));
            }
        }

        let mut cmd = Command::new(&exe_path);
        cmd.args(args);
        match run_with_timeout(cmd, self.config.timeouts.process).await {
            ProcessOutcome::Completed(output) => {
                outcome.advance(CaseState::Ran);
                if !output.stderr.is_empty() {
                    tracing::debug!(
                        case = %outcome.name,
                        stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                        "program stderr"
                    );
                }
                Execution::Finished(outcome, output)
            }
            ProcessOutcome::TimedOut => {
                outcome.advance(CaseState::TimedOut);
                Execution::Stopped(outcome.fail(FailureKind::Timeout {
                    seconds: self.config.timeouts.process.as_secs(),
                }))
            }
            ProcessOutcome::SpawnFailed(err) => Execution::Stopped(outcome.fail(
                FailureKind::Spawn {
                    message: format!("{}: {err}", exe_path.display()),
                },
            )),
            ProcessOutcome::WaitFailed(err) => Execution::Stopped(outcome.fail(
                FailureKind::Io {
                    message: format!("wait for {}: {err}", exe_path.display()),
                },
            )),
        }
    }
}

/// `PASS: <name> ...` / `FAIL: <name> ...` lines of the self-test program.
fn parse_self_test_lines(stdout: &str) -> Vec<(String, bool)> {
    stdout
        .lines()
        .filter_map(|line| {
            let (rest, ok) = if let Some(rest) = line.strip_prefix("PASS:") {
                (rest, true)
            } else if let Some(rest) = line.strip_prefix("FAIL:") {
                (rest, false)
            } else {
                return None;
            };
            let name = rest.split_whitespace().next()?;
            Some((name.to_string(), ok))
        })
        .collect()
}
