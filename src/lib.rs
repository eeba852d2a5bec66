//! Headless conformance harness for the `libiui` widget library.
//!
//! Parses the MD3 design-spec DSL, turns it into compile-time compliance
//! checks, drives synthesized C conformance programs against the headless
//! backend and compares their screenshots with golden baselines.
//!
//! # Module Overview
//!
//! - [`dsl`] - MD3 spec DSL parser
//! - [`compliance`] - invariant table, check generation and report parsing
//! - [`raster`] - minimal decoder for the backend's PNG screenshots
//! - [`compare`] - per-channel tolerant image comparison and diff heatmaps
//! - [`driver`] - program synthesis, compilation and execution of cases
//! - [`config`] - configuration file support
//! - [`types`] - spec model and result types
//! - [`output`] - JSON output schemas
//!
//! # Example
//!
//! ```no_run
//! use iuic_lib::{Config, Driver};
//!
//! # async fn example() {
//! let driver = Driver::new(Config::default());
//! let outcome = driver.run_case("button", false).await;
//! println!("{}: {}", outcome.name, outcome.passed);
//! # }
//! ```

pub mod compare;
pub mod compliance;
pub mod config;
pub mod driver;
pub mod dsl;
pub mod error;
pub mod output;
pub mod raster;
pub mod types;

pub use compare::{compare, write_diff_heatmap, DEFAULT_TOLERANCE};
pub use compliance::{
    generate_checks, parse_report, ComplianceReport, GeneratedChecks, GenerationStatus,
    InvariantTable,
};
pub use config::Config;
pub use driver::{Driver, VisualMode};
pub use error::{ErrorCategory, ErrorPayload, HarnessError, Result};
pub use output::{
    BuildOutput, CleanOutput, ErrorOutput, HarnessOutput, ListOutput, ListedCase, RunOutput,
    RunSummary, Suite, OUTPUT_VERSION,
};
pub use raster::{decode, FormatError, Raster};
pub use types::{
    CaseOutcome, CaseState, CompareMode, ComparisonResult, ComplianceCheck, ComponentSpec,
    FailureKind, Property, SpecDocument,
};
