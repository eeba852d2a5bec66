//! Cross-references parsed spec components against the compiled dimension
//! constants of the widget library.
//!
//! The generator only keeps properties whose DSL value already agrees with
//! the table (within [`VALUE_EPSILON`]); the compliance program then checks
//! that the compiled constant still has that value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ComplianceCheck, Property, SpecDocument};

/// Maximum absolute difference between a DSL value and the table value.
pub const VALUE_EPSILON: f64 = 0.1;

/// Expected compiled constant for one component property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Invariant {
    pub constant: &'static str,
    pub expected: f64,
}

/// Immutable component → property → invariant mapping.
#[derive(Debug, Clone, Default)]
pub struct InvariantTable {
    entries: BTreeMap<String, BTreeMap<Property, Invariant>>,
}

impl InvariantTable {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Property, &'static str, f64)>,
        S: Into<String>,
    {
        let mut table: BTreeMap<String, BTreeMap<Property, Invariant>> = BTreeMap::new();
        for (component, property, constant, expected) in entries {
            table
                .entry(component.into())
                .or_default()
                .insert(property, Invariant { constant, expected });
        }
        Self { entries: table }
    }

    /// Dimension constants exported by `iui-spec.h`.
    pub fn md3() -> Self {
        use Property::*;
        Self::from_entries([
            ("button", HeightMin, "IUI_BUTTON_HEIGHT", 40.0),
            ("textfield", HeightMin, "IUI_TEXTFIELD_HEIGHT", 56.0),
            ("switch", TrackWidth, "IUI_SWITCH_TRACK_WIDTH", 52.0),
            ("switch", TrackHeight, "IUI_SWITCH_TRACK_HEIGHT", 32.0),
            ("chip", HeightMin, "IUI_CHIP_HEIGHT", 32.0),
            ("fab", SizeExact, "IUI_FAB_SIZE", 56.0),
            ("segmented", HeightExact, "IUI_SEGMENTED_HEIGHT", 40.0),
            ("segmented", IconSize, "IUI_SEGMENTED_ICON_SIZE", 18.0),
            ("slider", TrackHeight, "IUI_SLIDER_TRACK_HEIGHT", 4.0),
            ("tab", HeightMin, "IUI_TAB_HEIGHT", 48.0),
            ("search_bar", HeightMin, "IUI_SEARCH_BAR_HEIGHT", 56.0),
            ("search_bar", CornerRadius, "IUI_SEARCH_BAR_CORNER_RADIUS", 28.0),
            ("nav_bar", HeightExact, "IUI_NAV_BAR_HEIGHT", 80.0),
            ("appbar_small", HeightExact, "IUI_APPBAR_SMALL_HEIGHT", 64.0),
            ("appbar_medium", HeightExact, "IUI_APPBAR_MEDIUM_HEIGHT", 112.0),
            ("appbar_large", HeightExact, "IUI_APPBAR_LARGE_HEIGHT", 152.0),
            ("list_item_one_line", HeightExact, "IUI_LIST_ONE_LINE_HEIGHT", 56.0),
            ("list_item_two_line", HeightExact, "IUI_LIST_TWO_LINE_HEIGHT", 72.0),
            ("list_item_three_line", HeightExact, "IUI_LIST_THREE_LINE_HEIGHT", 88.0),
        ])
    }

    pub fn component(&self, name: &str) -> Option<&BTreeMap<Property, Invariant>> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A declared property that disagreed with the table and was left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedProperty {
    pub component: String,
    pub property: Property,
    pub declared: f64,
    pub expected: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratedChecks {
    pub checks: Vec<ComplianceCheck>,
    pub skipped: Vec<SkippedProperty>,
    /// Components that appear in both the document and the table.
    pub components_matched: usize,
    pub document_empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    /// The document declared no components at all.
    EmptyDocument,
    /// Components exist but none produced a check.
    NothingToCheck,
    Ready(usize),
}

impl GeneratedChecks {
    pub fn status(&self) -> GenerationStatus {
        if self.document_empty {
            GenerationStatus::EmptyDocument
        } else if self.checks.is_empty() {
            GenerationStatus::NothingToCheck
        } else {
            GenerationStatus::Ready(self.checks.len())
        }
    }
}

/// Emit one check per declared property that matches its table entry.
pub fn generate_checks(doc: &SpecDocument, table: &InvariantTable) -> GeneratedChecks {
    let mut out = GeneratedChecks {
        document_empty: doc.is_empty(),
        ..Default::default()
    };

    for (name, component) in &doc.components {
        let Some(invariants) = table.component(name) else {
            continue;
        };
        out.components_matched += 1;

        for (property, invariant) in invariants {
            let Some(declared) = component.value(*property) else {
                continue;
            };
            if (declared - invariant.expected).abs() < VALUE_EPSILON {
                out.checks.push(ComplianceCheck {
                    subject_name: name.clone(),
                    property: *property,
                    expected_value: invariant.expected,
                    constant: invariant.constant.to_string(),
                });
            } else {
                tracing::debug!(
                    component = %name,
                    property = %property,
                    declared,
                    expected = invariant.expected,
                    "spec value disagrees with compiled constant table; no check emitted"
                );
                out.skipped.push(SkippedProperty {
                    component: name.clone(),
                    property: *property,
                    declared,
                    expected: invariant.expected,
                });
            }
        }
    }

    out
}

impl ComplianceCheck {
    /// Expected value as the integer the C side compares against.
    pub fn expected_int(&self) -> i64 {
        self.expected_value as i64
    }

    /// Pass iff the compiled constant, truncated to an integer, equals the
    /// expected value.
    pub fn evaluate(&self, actual: f64) -> bool {
        actual as i64 == self.expected_int()
    }

    /// C statement for the compliance program.
    pub fn to_c_statement(&self) -> String {
        format!(
            "check(\"{}\", (int){} == {} ? 0 : 1);",
            self.name(),
            self.constant,
            self.expected_int()
        )
    }
}

/// Parsed stdout of the compliance program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub ok: Vec<String>,
    pub failed: Vec<String>,
    /// Count reported by the program's `violations:` line, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<u64>,
}

/// Read the `OK:<name>`, `FAIL:<name>:0x<code>` and `violations:<n>` lines.
pub fn parse_report(stdout: &str) -> ComplianceReport {
    let mut report = ComplianceReport::default();
    for line in stdout.lines() {
        let line = line.trim();
        if let Some(name) = line.strip_prefix("OK:") {
            report.ok.push(name.to_string());
        } else if let Some(rest) = line.strip_prefix("FAIL:") {
            let name = rest.split(':').next().unwrap_or(rest);
            report.failed.push(name.to_string());
        } else if let Some(count) = line.strip_prefix("violations:") {
            report.violations = count.trim().parse().ok();
        }
    }
    report
}

impl ComplianceReport {
    pub fn failure_count(&self) -> u64 {
        self.violations.unwrap_or(self.failed.len() as u64)
    }

    pub fn passed(&self) -> bool {
        self.failure_count() == 0
    }
}
