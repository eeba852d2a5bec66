mod maintenance;
mod suites;

use std::path::PathBuf;
use std::process::ExitCode;

use iuic_lib::driver::build::build_library;
use iuic_lib::{CaseOutcome, Config, HarnessError, HarnessOutput, RunOutput};

use crate::cli::OutputFormat;
use crate::formatting::{emit, exit_code_for_run, render_error};
use crate::settings::{apply_overrides, load_config, log_effective_config, CliOverrides};

pub use maintenance::{run_build, run_clean, run_list};
pub use suites::{run_all, run_golden, run_ipc, run_spec, run_test, run_visual};

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub overrides: CliOverrides,
}

impl GlobalArgs {
    fn fail(&self, err: HarnessError) -> ExitCode {
        render_error(err, self.format, self.output.clone())
    }

    fn finish(&self, body: HarnessOutput, code: ExitCode) -> ExitCode {
        emit(&body, self.format, self.output.clone(), code)
    }

    /// Emit a run report; exit 0 iff every case passed.
    fn finish_run(&self, run: RunOutput) -> ExitCode {
        let code = exit_code_for_run(run.passed);
        self.finish(HarnessOutput::Run(run), code)
    }
}

/// Load the config file and apply CLI overrides.
fn resolve_config(globals: &GlobalArgs) -> Result<Config, HarnessError> {
    let config = load_config(globals.config.as_deref())?;
    let config = apply_overrides(config, &globals.overrides)?;
    log_effective_config(&config, globals.config.as_deref());
    Ok(config)
}

/// Make sure the library exists, building it when it is missing and no
/// explicit path was configured.
async fn ensure_library(config: &Config) -> Result<PathBuf, HarnessError> {
    let library = config.paths.library();
    if library.is_file() {
        return Ok(library);
    }
    if config.paths.library.is_some() {
        return Err(HarnessError::Config(format!(
            "Library not found: {}",
            library.display()
        )));
    }
    tracing::info!(library = %library.display(), "library missing, building it");
    build_library(config).await
}

fn log_outcome(outcome: &CaseOutcome) {
    match outcome.error_text() {
        None => tracing::info!(case = %outcome.name, "passed"),
        Some(reason) => tracing::info!(case = %outcome.name, %reason, "failed"),
    }
}
