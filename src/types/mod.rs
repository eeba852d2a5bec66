//! Core types used throughout the harness.
//!
//! - [`spec`] - the parsed design-spec model ([`ComponentSpec`], [`SpecDocument`])
//! - [`results`] - per-run results ([`ComplianceCheck`], [`ComparisonResult`], [`CaseOutcome`])

pub mod results;
pub mod spec;

pub use results::{
    CaseOutcome, CaseState, CompareMode, ComparisonResult, ComplianceCheck, FailureKind,
};
pub use spec::{ComponentSpec, CornerRadius, Property, SpecDocument, DEFAULT_GRID_UNIT};
