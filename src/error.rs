use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::raster::FormatError;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid image {path}: {source}")]
    Format {
        path: String,
        #[source]
        source: FormatError,
    },

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Build error: {0}")]
    Build(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl HarnessError {
    pub fn format(path: impl Into<String>, source: FormatError) -> Self {
        HarnessError::Format {
            path: path.into(),
            source,
        }
    }

    pub fn build(message: impl Into<String>) -> Self {
        HarnessError::Build(message.into())
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            HarnessError::Io(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check file paths/permissions.",
            ),
            HarnessError::Format { .. } => ErrorPayload::new(
                ErrorCategory::Image,
                self.to_string(),
                "Only 8-bit RGBA PNGs without row filters are supported; regenerate the golden with `iuic golden`.",
            ),
            HarnessError::Image(e) => ErrorPayload::new(
                ErrorCategory::Image,
                e.to_string(),
                "Verify image path/format and readability.",
            ),
            HarnessError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Check JSON/serialization inputs; run with --verbose for details.",
            ),
            HarnessError::ConfigFile(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Fix the TOML syntax in the config file or pass --config with a valid file.",
            ),
            HarnessError::Config(msg) => {
                let lower = msg.to_ascii_lowercase();
                if lower.contains("library") && lower.contains("not found") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Run `iuic build` first, or point --lib at an existing libiui.a.",
                    )
                } else if lower.contains("tolerance") || lower.contains("similarity") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Use a tolerance between 0 and 255 and a min similarity between 0 and 100.",
                    )
                } else if lower.contains("timeout") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Timeouts must be non-zero humantime durations such as \"10s\" or \"2m\".",
                    )
                } else if lower.contains("spec file") || lower.contains("dsl") {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Pass --dsl with the path to the MD3 spec file (default: src/md3-spec.dsl under --root).",
                    )
                } else {
                    ErrorPayload::new(
                        ErrorCategory::Config,
                        msg.to_string(),
                        "Check flags/paths (e.g., --root, --lib) and the config file.",
                    )
                }
            }
            HarnessError::Build(msg) => ErrorPayload::new(
                ErrorCategory::Build,
                msg.to_string(),
                "Ensure cc, make and python3 are on PATH and the library tree builds on its own.",
            ),
            HarnessError::Unknown(msg) => ErrorPayload::new(
                ErrorCategory::Unknown,
                msg.to_string(),
                "Re-run with --verbose; file an issue if persistent.",
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Build,
    Image,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_payload_includes_build_hint_for_missing_library() {
        let err = HarnessError::Config("library not found: /tmp/libiui.a".to_string());
        let payload = err.to_payload();
        assert_eq!(payload.category, ErrorCategory::Config);
        let remediation = payload.remediation.unwrap_or_default();
        assert!(
            remediation.contains("iuic build"),
            "expected remediation to mention iuic build, got: {remediation}"
        );
    }

    #[test]
    fn config_payload_uses_default_remediation_for_other_messages() {
        let err = HarnessError::Config("Some other config issue".to_string());
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(
            remediation.contains("Check flags/paths"),
            "expected default remediation for generic config errors"
        );
    }

    #[test]
    fn config_payload_includes_tolerance_range() {
        let err = HarnessError::Config("min similarity must be within 0..=100".to_string());
        let remediation = err.to_payload().remediation.unwrap_or_default();
        assert!(remediation.contains("255"), "got: {remediation}");
    }

    #[test]
    fn format_errors_name_the_file() {
        let err = HarnessError::format("tests/golden/button.png", FormatError::BadSignature);
        let payload = err.to_payload();
        assert_eq!(payload.category, ErrorCategory::Image);
        assert!(payload.message.contains("tests/golden/button.png"));
        assert!(payload.message.contains("Not a valid PNG"));
    }

    #[test]
    fn build_errors_are_categorised() {
        let payload = HarnessError::build("make exited with status 2").to_payload();
        assert_eq!(payload.category, ErrorCategory::Build);
        assert!(payload.remediation.unwrap_or_default().contains("make"));
    }

    #[test]
    fn payload_serializes_lowercase_category() {
        let payload = HarnessError::Unknown("boom".into()).to_payload();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["category"], "unknown");
        assert_eq!(json["message"], "boom");
    }
}
