use std::process::ExitCode;

use iuic_lib::driver::build::build_library;
use iuic_lib::driver::cases::registry;
use iuic_lib::{BuildOutput, CleanOutput, HarnessOutput, ListOutput, ListedCase, OUTPUT_VERSION};

use super::{resolve_config, GlobalArgs};

/// Registry listing; needs neither config nor library.
pub fn run_list(globals: &GlobalArgs) -> ExitCode {
    let cases = registry()
        .iter()
        .map(|case| ListedCase {
            name: case.name.to_string(),
            description: case.description.to_string(),
            interactive: case.is_interactive(),
        })
        .collect();
    globals.finish(
        HarnessOutput::List(ListOutput {
            version: OUTPUT_VERSION.to_string(),
            cases,
        }),
        ExitCode::SUCCESS,
    )
}

/// Rebuild the headless library unconditionally.
pub async fn run_build(globals: &GlobalArgs) -> ExitCode {
    let config = match resolve_config(globals) {
        Ok(config) => config,
        Err(err) => return globals.fail(err),
    };
    match build_library(&config).await {
        Ok(library) => globals.finish(
            HarnessOutput::Build(BuildOutput {
                version: OUTPUT_VERSION.to_string(),
                library,
            }),
            ExitCode::SUCCESS,
        ),
        Err(err) => globals.fail(err),
    }
}

/// Remove the build directory if it exists.
pub fn run_clean(globals: &GlobalArgs) -> ExitCode {
    let config = match resolve_config(globals) {
        Ok(config) => config,
        Err(err) => return globals.fail(err),
    };
    let build_dir = config.paths.build_dir();
    let removed = build_dir.is_dir();
    if removed {
        if let Err(err) = std::fs::remove_dir_all(&build_dir) {
            return globals.fail(err.into());
        }
        tracing::debug!(dir = %build_dir.display(), "removed build directory");
    }
    globals.finish(
        HarnessOutput::Clean(CleanOutput {
            version: OUTPUT_VERSION.to_string(),
            build_dir,
            removed,
        }),
        ExitCode::SUCCESS,
    )
}
