//! Ordered property rules for lines inside a `COMPONENT` block.
//!
//! Rules are tried top to bottom and the first pattern that matches wins, so
//! the order of [`RULES`] is part of the grammar.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::types::{ComponentSpec, CornerRadius};

/// Field a matched rule writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    HeightMin,
    HeightExact,
    SizeExact,
    TouchTarget,
    CornerRadiusToken,
    CornerRadius,
    TrackHeight,
    TrackWidth,
    ThumbSize,
    IconSize,
    PaddingH,
}

pub(crate) struct Rule {
    pub pattern: &'static str,
    pub field: Field,
}

pub(crate) const RULES: &[Rule] = &[
    Rule {
        pattern: r"^height\s+MIN\s+(\d+(?:\.\d+)?)",
        field: Field::HeightMin,
    },
    Rule {
        pattern: r"^height\s+EXACT\s+(\d+(?:\.\d+)?)\s*(?:±(\d+))?",
        field: Field::HeightExact,
    },
    Rule {
        pattern: r"^size\s+EXACT\s+(\d+(?:\.\d+)?)\s*(?:±(\d+))?",
        field: Field::SizeExact,
    },
    Rule {
        pattern: r"^touch_target\s+(\d+(?:\.\d+)?)",
        field: Field::TouchTarget,
    },
    Rule {
        pattern: r"^corner_radius\s+@shape\.(\w+)",
        field: Field::CornerRadiusToken,
    },
    Rule {
        pattern: r"^corner_radius\s+(\d+(?:\.\d+)?)",
        field: Field::CornerRadius,
    },
    Rule {
        pattern: r"^track_height\s+(\d+(?:\.\d+)?)",
        field: Field::TrackHeight,
    },
    Rule {
        pattern: r"^track_width\s+(\d+(?:\.\d+)?)",
        field: Field::TrackWidth,
    },
    Rule {
        pattern: r"^thumb_size\s+(\d+(?:\.\d+)?)",
        field: Field::ThumbSize,
    },
    Rule {
        pattern: r"^icon_size\s+(\d+(?:\.\d+)?)",
        field: Field::IconSize,
    },
    Rule {
        pattern: r"^padding_h\s+(\d+(?:\.\d+)?)",
        field: Field::PaddingH,
    },
];

static COMPILED: Lazy<Vec<(Regex, Field)>> = Lazy::new(|| {
    RULES
        .iter()
        .map(|rule| (Regex::new(rule.pattern).expect("regex compiles"), rule.field))
        .collect()
});

/// Outcome of running a line through the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RuleMatch {
    Applied(Field),
    /// A rule matched but its value could not be converted.
    Rejected(Field),
    NoMatch,
}

pub(crate) fn apply(line: &str, spec: &mut ComponentSpec) -> RuleMatch {
    for (regex, field) in COMPILED.iter() {
        let Some(caps) = regex.captures(line) else {
            continue;
        };
        return if write_field(*field, &caps, spec).is_some() {
            RuleMatch::Applied(*field)
        } else {
            RuleMatch::Rejected(*field)
        };
    }
    RuleMatch::NoMatch
}

fn write_field(field: Field, caps: &Captures<'_>, spec: &mut ComponentSpec) -> Option<()> {
    let raw = caps.get(1)?.as_str();
    let number = || raw.parse::<f64>().ok();
    match field {
        Field::HeightMin => spec.height_min = Some(number()?),
        Field::HeightExact => {
            let (value, tolerance) = (number()?, tolerance(caps)?);
            spec.height_exact = Some(value);
            spec.height_tolerance = tolerance;
        }
        Field::SizeExact => {
            let (value, tolerance) = (number()?, tolerance(caps)?);
            spec.size_exact = Some(value);
            spec.size_tolerance = tolerance;
        }
        Field::TouchTarget => spec.touch_target = Some(number()?),
        Field::CornerRadiusToken => {
            spec.corner_radius = Some(CornerRadius::Token(raw.to_string()));
        }
        Field::CornerRadius => spec.corner_radius = Some(CornerRadius::Value(number()?)),
        Field::TrackHeight => spec.track_height = Some(number()?),
        Field::TrackWidth => spec.track_width = Some(number()?),
        Field::ThumbSize => spec.thumb_size = Some(number()?),
        Field::IconSize => spec.icon_size = Some(number()?),
        Field::PaddingH => spec.padding_h = Some(number()?),
    }
    Some(())
}

/// Optional `±N` group; absent means 0.
fn tolerance(caps: &Captures<'_>) -> Option<u32> {
    match caps.get(2) {
        Some(m) if !m.as_str().is_empty() => m.as_str().parse().ok(),
        _ => Some(0),
    }
}
