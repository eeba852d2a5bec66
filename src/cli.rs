use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iuic")]
#[command(
    version,
    about = "Headless conformance harness for the libiui widget library",
    long_about = "iuic - headless conformance harness\n\nModes:\n- run: every unified case, then MD3 spec compliance and runtime validation.\n- test: a single unified case.\n- golden / visual: store or compare screenshots against golden baselines.\n- spec: MD3 spec DSL compliance only.\n- ipc: shared-memory IPC self test.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, short, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Optional config file (TOML); defaults to ./iuic.toml when present. CLI flags override config"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH", help = "Project root of the widget library")]
    pub root: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Path to a pre-built libiui.a (skips the automatic build)"
    )]
    pub lib: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value = "json", help = "Output format")]
    pub format: OutputFormat,

    #[arg(long, short, global = true, help = "Output file path (stdout if omitted)")]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run all unified cases, then spec compliance and runtime validation
    Run {
        #[arg(long, short, help = "Save a PNG screenshot per case")]
        screenshot: bool,
    },

    /// Run a single unified case
    Test {
        #[arg(help = "Case name (see `iuic list`)")]
        name: String,

        #[arg(long, short, help = "Save a PNG screenshot")]
        screenshot: bool,
    },

    /// List the unified cases
    List,

    /// Rebuild the headless library
    Build,

    /// Remove the build directory
    Clean,

    /// Generate golden images for every case
    Golden,

    /// Compare every case against its golden image
    Visual {
        #[arg(long, value_name = "N", help = "Per-channel tolerance (default: 2)")]
        tolerance: Option<u8>,

        #[arg(
            long,
            value_name = "PERCENT",
            help = "Pass at or above this similarity instead of requiring an exact match"
        )]
        min_similarity: Option<f64>,
    },

    /// Check the MD3 spec DSL against the compiled constants
    Spec {
        #[arg(long, value_name = "PATH", help = "MD3 spec file (default: <root>/src/md3-spec.dsl)")]
        dsl: Option<PathBuf>,
    },

    /// Run the shared-memory IPC self test
    Ipc,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}
