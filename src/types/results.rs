//! Result types produced per run: compliance checks, image comparisons and
//! conformance case outcomes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::spec::Property;

/// One named assertion emitted for the compliance program.
///
/// The harness only knows the expected value; the actual value is the
/// compiled constant named by `constant`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheck {
    pub subject_name: String,
    pub property: Property,
    pub expected_value: f64,
    pub constant: String,
}

impl ComplianceCheck {
    /// Check name as printed by the compliance program, e.g. `button_height_min`.
    pub fn name(&self) -> String {
        format!("{}_{}", self.subject_name, self.property)
    }
}

/// Outcome of comparing two rasters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub is_match: bool,
    /// In `[0, 100]`.
    pub similarity_percent: f64,
    pub differing_pixels: u64,
}

/// How a comparison result is turned into a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum CompareMode {
    /// Zero differing pixels.
    #[default]
    Strict,
    /// Similarity percentage at or above the given floor.
    MinSimilarity(f64),
}

impl ComparisonResult {
    pub fn passes(&self, mode: CompareMode) -> bool {
        match mode {
            CompareMode::Strict => self.is_match,
            CompareMode::MinSimilarity(floor) => self.similarity_percent >= floor,
        }
    }
}

/// Lifecycle of a single conformance case.
///
/// `Pending -> Built | BuildFailed`, `Built -> Ran | TimedOut`,
/// `Ran -> Passed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseState {
    Pending,
    Built,
    BuildFailed,
    Ran,
    TimedOut,
    Passed,
    Failed,
}

impl CaseState {
    pub fn can_transition_to(self, next: CaseState) -> bool {
        use CaseState::*;
        matches!(
            (self, next),
            (Pending, Built)
                | (Pending, BuildFailed)
                | (Built, Ran)
                | (Built, TimedOut)
                | (Ran, Passed)
                | (Ran, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CaseState::BuildFailed | CaseState::TimedOut | CaseState::Passed | CaseState::Failed
        )
    }
}

/// Why a case failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum FailureKind {
    UnknownCase,
    LibraryMissing { path: String },
    Build { diagnostics: String },
    Spawn { message: String },
    Timeout { seconds: u64 },
    /// Exit status non-zero or `passed:0` reported by the program.
    Runtime { exit_code: Option<i32> },
    DrawCalls { observed: u64, minimum: u64 },
    NoScreenshot,
    NoBaseline { path: String },
    BaselineMismatch { similarity_percent: f64, differing_pixels: u64 },
    Decode { reason: String },
    NoChecks,
    Violations { count: u64 },
    Io { message: String },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::UnknownCase => write!(f, "unknown test"),
            FailureKind::LibraryMissing { path } => write!(f, "library not found: {path}"),
            FailureKind::Build { diagnostics } => {
                let head: String = diagnostics.chars().take(200).collect();
                write!(f, "compile: {}", head.trim())
            }
            FailureKind::Spawn { message } => write!(f, "spawn failed: {message}"),
            FailureKind::Timeout { seconds } => write!(f, "timeout after {seconds}s"),
            FailureKind::Runtime { .. } => write!(f, "validation failed"),
            FailureKind::DrawCalls { observed, minimum } => {
                write!(f, "box calls {observed} < {minimum}")
            }
            FailureKind::NoScreenshot => write!(f, "screenshot not generated"),
            FailureKind::NoBaseline { path } => write!(f, "no golden image: {path}"),
            FailureKind::BaselineMismatch {
                similarity_percent,
                differing_pixels,
            } => write!(
                f,
                "{similarity_percent:.1}% match ({differing_pixels} pixels differ)"
            ),
            FailureKind::Decode { reason } => write!(f, "compare failed: {reason}"),
            FailureKind::NoChecks => write!(f, "no compliance checks generated"),
            FailureKind::Violations { count } => write!(f, "{count} violations"),
            FailureKind::Io { message } => write!(f, "io: {message}"),
        }
    }
}

/// Structured `(passed, info)` result of one case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseOutcome {
    pub name: String,
    pub description: String,
    pub state: CaseState,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub info: BTreeMap<String, Value>,
}

impl CaseOutcome {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            state: CaseState::Pending,
            passed: false,
            failure: None,
            info: BTreeMap::new(),
        }
    }

    /// Move to `next`; invalid transitions are ignored and logged.
    pub fn advance(&mut self, next: CaseState) {
        if self.state.can_transition_to(next) {
            self.state = next;
        } else {
            tracing::warn!(
                case = %self.name,
                from = ?self.state,
                to = ?next,
                "ignoring invalid case state transition"
            );
        }
    }

    pub fn pass(mut self) -> Self {
        self.advance(CaseState::Passed);
        self.passed = self.state == CaseState::Passed;
        self
    }

    /// Record a failure. Terminal states other than `Passed` are kept as-is.
    pub fn fail(mut self, failure: FailureKind) -> Self {
        if !self.state.is_terminal() {
            match self.state {
                CaseState::Ran => self.advance(CaseState::Failed),
                _ => self.state = CaseState::Failed,
            }
        }
        self.passed = false;
        self.failure = Some(failure);
        self
    }

    pub fn with_info(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.info.insert(key.to_string(), value.into());
        self
    }

    pub fn error_text(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_failed_and_timed_out_are_terminal_before_ran() {
        assert!(CaseState::Pending.can_transition_to(CaseState::BuildFailed));
        assert!(CaseState::BuildFailed.is_terminal());
        assert!(!CaseState::BuildFailed.can_transition_to(CaseState::Ran));
        assert!(CaseState::Built.can_transition_to(CaseState::TimedOut));
        assert!(CaseState::TimedOut.is_terminal());
        assert!(!CaseState::TimedOut.can_transition_to(CaseState::Failed));
    }

    #[test]
    fn only_ran_cases_reach_a_verdict() {
        assert!(CaseState::Ran.can_transition_to(CaseState::Passed));
        assert!(CaseState::Ran.can_transition_to(CaseState::Failed));
        assert!(!CaseState::Pending.can_transition_to(CaseState::Passed));
        assert!(!CaseState::Built.can_transition_to(CaseState::Passed));
    }

    #[test]
    fn failing_after_build_failure_keeps_state() {
        let mut outcome = CaseOutcome::new("button", "Button click response");
        outcome.advance(CaseState::BuildFailed);
        let outcome = outcome.fail(FailureKind::Build {
            diagnostics: "error: iui.h not found".into(),
        });
        assert_eq!(outcome.state, CaseState::BuildFailed);
        assert!(!outcome.passed);
        assert!(outcome.error_text().unwrap().starts_with("compile:"));
    }

    #[test]
    fn pass_requires_ran_state() {
        let outcome = CaseOutcome::new("card", "Card container").pass();
        assert!(!outcome.passed);

        let mut outcome = CaseOutcome::new("card", "Card container");
        outcome.advance(CaseState::Built);
        outcome.advance(CaseState::Ran);
        let outcome = outcome.pass();
        assert!(outcome.passed);
        assert_eq!(outcome.state, CaseState::Passed);
    }

    #[test]
    fn compare_modes_apply_to_results() {
        let result = ComparisonResult {
            is_match: false,
            similarity_percent: 99.5,
            differing_pixels: 3,
        };
        assert!(!result.passes(CompareMode::Strict));
        assert!(result.passes(CompareMode::MinSimilarity(99.0)));
        assert!(!result.passes(CompareMode::MinSimilarity(99.9)));
    }

    #[test]
    fn check_name_joins_subject_and_property() {
        let check = ComplianceCheck {
            subject_name: "button".into(),
            property: Property::HeightMin,
            expected_value: 40.0,
            constant: "IUI_BUTTON_HEIGHT".into(),
        };
        assert_eq!(check.name(), "button_height_min");
    }
}
