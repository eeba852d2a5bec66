use std::path::PathBuf;
use std::process::ExitCode;

use iuic_lib::driver::cases::{self, registry};
use iuic_lib::{CaseOutcome, Driver, FailureKind, HarnessError, RunOutput, Suite, VisualMode};

use super::{ensure_library, log_outcome, resolve_config, GlobalArgs};
use crate::settings::compare_mode;

/// Resolve config, make sure the library exists and hand back a driver.
async fn prepare(globals: &GlobalArgs) -> Result<Driver, HarnessError> {
    let config = resolve_config(globals)?;
    ensure_library(&config).await?;
    Ok(Driver::new(config))
}

/// Every unified case, then spec compliance and runtime validation.
pub async fn run_all(globals: &GlobalArgs, screenshot: bool) -> ExitCode {
    let driver = match prepare(globals).await {
        Ok(driver) => driver,
        Err(err) => return globals.fail(err),
    };

    let mut outcomes = Vec::with_capacity(registry().len() + 2);
    for case in registry() {
        let outcome = driver.run_case(case.name, screenshot).await;
        log_outcome(&outcome);
        outcomes.push(outcome);
    }
    let dsl = driver.config().paths.dsl();
    let spec = driver.run_spec_compliance(&dsl).await;
    log_outcome(&spec);
    outcomes.push(spec);
    let runtime = driver.run_runtime_validation().await;
    log_outcome(&runtime);
    outcomes.push(runtime);

    globals.finish_run(RunOutput::new(Suite::All, outcomes))
}

/// One named case. Unknown names fail without touching the library.
pub async fn run_test(globals: &GlobalArgs, name: &str, screenshot: bool) -> ExitCode {
    if cases::find(name).is_none() {
        tracing::warn!(case = name, "unknown test");
        let outcome = CaseOutcome::new(name, name).fail(FailureKind::UnknownCase);
        return globals.finish_run(RunOutput::new(Suite::Test, vec![outcome]));
    }
    let driver = match prepare(globals).await {
        Ok(driver) => driver,
        Err(err) => return globals.fail(err),
    };
    let outcome = driver.run_case(name, screenshot).await;
    log_outcome(&outcome);
    globals.finish_run(RunOutput::new(Suite::Test, vec![outcome]))
}

/// Store a golden image for every case.
pub async fn run_golden(globals: &GlobalArgs) -> ExitCode {
    let driver = match prepare(globals).await {
        Ok(driver) => driver,
        Err(err) => return globals.fail(err),
    };
    let outcomes = visual_pass(&driver, VisualMode::Generate).await;
    let golden_dir = driver.config().paths.golden_dir();
    globals.finish_run(RunOutput::new(Suite::Golden, outcomes).with_golden_dir(golden_dir))
}

/// Compare every case against its golden image.
pub async fn run_visual(globals: &GlobalArgs) -> ExitCode {
    let driver = match prepare(globals).await {
        Ok(driver) => driver,
        Err(err) => return globals.fail(err),
    };
    let mode = VisualMode::Compare {
        tolerance: driver.config().visual.tolerance,
        mode: compare_mode(driver.config()),
    };
    let outcomes = visual_pass(&driver, mode).await;
    globals.finish_run(RunOutput::new(Suite::Visual, outcomes))
}

async fn visual_pass(driver: &Driver, mode: VisualMode) -> Vec<CaseOutcome> {
    let mut outcomes = Vec::with_capacity(registry().len());
    for case in registry() {
        let outcome = driver.run_visual(case.name, mode).await;
        log_outcome(&outcome);
        outcomes.push(outcome);
    }
    outcomes
}

/// MD3 spec compliance only. A missing spec file is fatal.
pub async fn run_spec(globals: &GlobalArgs, dsl: Option<PathBuf>) -> ExitCode {
    let config = match resolve_config(globals) {
        Ok(config) => config,
        Err(err) => return globals.fail(err),
    };
    let dsl = dsl.unwrap_or_else(|| config.paths.dsl());
    if !dsl.is_file() {
        return globals.fail(HarnessError::Config(format!(
            "MD3 spec file not found: {}",
            dsl.display()
        )));
    }
    if let Err(err) = ensure_library(&config).await {
        return globals.fail(err);
    }

    let driver = Driver::new(config);
    let outcome = driver.run_spec_compliance(&dsl).await;
    log_outcome(&outcome);
    globals.finish_run(RunOutput::new(Suite::Spec, vec![outcome]))
}

/// Shared-memory IPC self test.
pub async fn run_ipc(globals: &GlobalArgs) -> ExitCode {
    if cfg!(windows) {
        let outcome = CaseOutcome::new("shm-ipc", "SHM IPC").fail(FailureKind::Spawn {
            message: "shared-memory IPC tests are not supported on Windows".to_string(),
        });
        return globals.finish_run(RunOutput::new(Suite::Ipc, vec![outcome]));
    }
    let driver = match prepare(globals).await {
        Ok(driver) => driver,
        Err(err) => return globals.fail(err),
    };
    let outcome = driver.run_ipc_smoke().await;
    log_outcome(&outcome);
    globals.finish_run(RunOutput::new(Suite::Ipc, vec![outcome]))
}
