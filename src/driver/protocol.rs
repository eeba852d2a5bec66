//! The `key:value` stdout protocol spoken by conformance programs.

use std::collections::BTreeMap;

/// Parsed stdout of a conformance program.
///
/// `frames`, `box`, `passed` and `saved` are reserved; any other key is a
/// test-specific echo variable such as `click_count` or `scroll_y`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StdoutRecord {
    pub frames: u64,
    pub box_calls: u64,
    pub passed: i64,
    pub saved: Option<String>,
    pub echoes: BTreeMap<String, String>,
}

impl StdoutRecord {
    /// Unparseable numbers leave the reserved field at zero. Lines without a
    /// `:` are ignored.
    pub fn parse(stdout: &str) -> Self {
        let mut record = Self::default();
        for line in stdout.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            match key {
                "frames" => record.frames = value.parse().unwrap_or(0),
                "box" => record.box_calls = value.parse().unwrap_or(0),
                "passed" => record.passed = value.parse().unwrap_or(0),
                "saved" => record.saved = Some(value.to_string()),
                "" => {}
                _ => {
                    record.echoes.insert(key.to_string(), value.to_string());
                }
            }
        }
        record
    }

    pub fn reported_pass(&self) -> bool {
        self.passed == 1
    }

    /// Echo value parsed as a number, if present.
    pub fn echo_number(&self, key: &str) -> Option<f64> {
        self.echoes.get(key)?.parse().ok()
    }
}
