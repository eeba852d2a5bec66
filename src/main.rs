mod cli;
mod commands;
mod formatting;
mod settings;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use cli::Commands;
use commands::{
    run_all, run_build, run_clean, run_golden, run_ipc, run_list, run_spec, run_test, run_visual,
    GlobalArgs,
};
use settings::CliOverrides;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    run().await
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> ExitCode {
    let args = cli::parse();
    init_tracing(args.verbose);

    let (tolerance, min_similarity) = match &args.command {
        Commands::Visual {
            tolerance,
            min_similarity,
        } => (*tolerance, *min_similarity),
        _ => (None, None),
    };
    let globals = GlobalArgs {
        config: args.config,
        format: args.format,
        output: args.output,
        overrides: CliOverrides {
            root: args.root,
            lib: args.lib,
            tolerance,
            min_similarity,
        },
    };

    match args.command {
        Commands::Run { screenshot } => run_all(&globals, screenshot).await,
        Commands::Test { name, screenshot } => run_test(&globals, &name, screenshot).await,
        Commands::List => run_list(&globals),
        Commands::Build => run_build(&globals).await,
        Commands::Clean => run_clean(&globals),
        Commands::Golden => run_golden(&globals).await,
        Commands::Visual { .. } => run_visual(&globals).await,
        Commands::Spec { dsl } => run_spec(&globals, dsl).await,
        Commands::Ipc => run_ipc(&globals).await,
    }
}
