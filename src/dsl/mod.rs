//! Parser for the MD3 design-spec DSL.
//!
//! The language is line oriented:
//!
//! ```text
//! # comment
//! GLOBAL grid_unit 4
//! GLOBAL shape {
//!   full 9999
//! }
//! COMPONENT button {
//!   height MIN 40
//!   corner_radius @shape.full
//! }
//! ```
//!
//! Parsing never fails. Lines the parser does not understand are counted in
//! [`SpecDocument::ignored_lines`] so newer spec files keep working with
//! older harness builds.

mod rules;

#[cfg(test)]
mod tests;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{ComponentSpec, SpecDocument};

use rules::RuleMatch;

/// `GLOBAL` blocks that are recognised but not modeled.
pub const SKIPPED_GLOBAL_BLOCKS: &[&str] = &["state_layer", "shape", "typography"];

static COMPONENT_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^COMPONENT\s+(\w+)\s*\{").expect("regex compiles"));
static GRID_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^GLOBAL\s+grid_unit\s+(\d+(?:\.\d+)?)").expect("regex compiles"));
static GLOBAL_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^GLOBAL\s+(\w+)\s*\{").expect("regex compiles"));

#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    Document,
    Component(String),
}

/// Parse spec text into a [`SpecDocument`].
pub fn parse(text: &str) -> SpecDocument {
    let mut doc = SpecDocument::default();
    let mut scope = Scope::Document;
    let mut skipping = false;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if skipping {
            if line == "}" {
                skipping = false;
            }
            continue;
        }

        if let Some(caps) = COMPONENT_OPEN.captures(line) {
            let name = caps[1].to_string();
            if doc.components.contains_key(&name) {
                tracing::debug!(component = %name, line = index + 1, "component redeclared; replacing");
            }
            doc.components
                .insert(name.clone(), ComponentSpec::new(name.clone()));
            scope = Scope::Component(name);
            continue;
        }

        if let Some(caps) = GRID_UNIT.captures(line) {
            match caps[1].parse::<f64>() {
                Ok(unit) => doc.grid_unit = unit,
                Err(_) => ignore(&mut doc, index, line),
            }
            continue;
        }

        if let Some(caps) = GLOBAL_BLOCK.captures(line) {
            if SKIPPED_GLOBAL_BLOCKS.contains(&&caps[1]) {
                skipping = true;
            } else {
                ignore(&mut doc, index, line);
            }
            continue;
        }

        if line == "}" {
            scope = Scope::Document;
            continue;
        }

        let Scope::Component(name) = &scope else {
            ignore(&mut doc, index, line);
            continue;
        };
        let Some(spec) = doc.components.get_mut(name) else {
            ignore(&mut doc, index, line);
            continue;
        };
        match rules::apply(line, spec) {
            RuleMatch::Applied(_) => {}
            RuleMatch::Rejected(field) => {
                tracing::debug!(line = index + 1, ?field, "property value out of range");
                doc.ignored_lines += 1;
            }
            RuleMatch::NoMatch => ignore(&mut doc, index, line),
        }
    }

    if skipping {
        tracing::debug!("input ended inside a skipped GLOBAL block");
    }
    doc
}

fn ignore(doc: &mut SpecDocument, index: usize, line: &str) {
    tracing::trace!(line = index + 1, text = line, "ignoring unrecognised spec line");
    doc.ignored_lines += 1;
}
