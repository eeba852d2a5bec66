use crate::error::ErrorPayload;
use crate::types::CaseOutcome;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Schema version for output payloads.
pub const OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum HarnessOutput {
    Run(RunOutput),
    List(ListOutput),
    Build(BuildOutput),
    Clean(CleanOutput),
    Error(ErrorOutput),
}

/// Which group of checks a run covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Suite {
    /// Unified cases, spec compliance and runtime validation.
    All,
    Test,
    Golden,
    Visual,
    Spec,
    Ipc,
}

impl Suite {
    pub fn title(self) -> &'static str {
        match self {
            Suite::All | Suite::Test => "Headless UI Tests",
            Suite::Golden => "Generating Golden Images",
            Suite::Visual => "Visual Regression Tests",
            Suite::Spec => "MD3 Specification Compliance",
            Suite::Ipc => "Shared Memory IPC Tests",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    pub version: String,
    pub suite: Suite,
    pub passed: bool,
    pub cases: Vec<CaseOutcome>,
    pub summary: RunSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub golden_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub passed: usize,
    pub total: usize,
}

impl RunOutput {
    /// A run passes when it has at least one case and every case passed.
    pub fn new(suite: Suite, cases: Vec<CaseOutcome>) -> Self {
        let summary = RunSummary {
            passed: cases.iter().filter(|c| c.passed).count(),
            total: cases.len(),
        };
        Self {
            version: OUTPUT_VERSION.to_string(),
            suite,
            passed: summary.total > 0 && summary.passed == summary.total,
            cases,
            summary,
            golden_dir: None,
        }
    }

    pub fn with_golden_dir(mut self, dir: PathBuf) -> Self {
        self.golden_dir = Some(dir);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOutput {
    pub version: String,
    pub cases: Vec<ListedCase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedCase {
    pub name: String,
    pub description: String,
    /// Injects input rather than only rendering.
    pub interactive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutput {
    pub version: String,
    pub library: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanOutput {
    pub version: String,
    pub build_dir: PathBuf,
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorOutput {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub error: ErrorPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CaseState, FailureKind};

    fn passed_case(name: &str) -> CaseOutcome {
        let mut outcome = CaseOutcome::new(name, name);
        outcome.advance(CaseState::Built);
        outcome.advance(CaseState::Ran);
        outcome.pass()
    }

    #[test]
    fn run_output_summarises_cases() {
        let output = RunOutput::new(
            Suite::All,
            vec![
                passed_case("button"),
                CaseOutcome::new("nope", "nope").fail(FailureKind::UnknownCase),
            ],
        );
        assert!(!output.passed);
        assert_eq!(output.summary, RunSummary { passed: 1, total: 2 });

        let json = serde_json::to_string(&HarnessOutput::Run(output)).expect("serialize run output");
        assert!(json.contains("\"mode\":\"run\""));
        assert!(json.contains("\"suite\":\"all\""));
        assert!(json.contains("\"kind\":\"unknownCase\""));
    }

    #[test]
    fn empty_run_does_not_pass() {
        let output = RunOutput::new(Suite::Visual, Vec::new());
        assert!(!output.passed);
    }

    #[test]
    fn list_output_serializes() {
        let output = HarnessOutput::List(ListOutput {
            version: OUTPUT_VERSION.to_string(),
            cases: vec![ListedCase {
                name: "button".into(),
                description: "Button click response".into(),
                interactive: true,
            }],
        });
        let json = serde_json::to_string(&output).expect("serialize list output");
        assert!(json.contains("\"mode\":\"list\""));
        assert!(json.contains("\"interactive\":true"));
    }

    #[test]
    fn golden_dir_is_optional() {
        let output = RunOutput::new(Suite::Golden, vec![passed_case("card")]);
        let json = serde_json::to_string(&output).unwrap();
        assert!(!json.contains("goldenDir"));

        let output = output.with_golden_dir(PathBuf::from("tests/golden"));
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"goldenDir\":\"tests/golden\""));
    }
}
