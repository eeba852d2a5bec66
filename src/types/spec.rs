//! Parsed design-spec model.
//!
//! One [`ComponentSpec`] per `COMPONENT` block of the DSL, collected into a
//! [`SpecDocument`]. These are plain data: the parser builds them once and
//! everything downstream only reads them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default layout grid unit when the document does not declare one.
pub const DEFAULT_GRID_UNIT: f64 = 4.0;

/// Corner radius is either a literal value or a reference to a shape token
/// (`@shape.full`), never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CornerRadius {
    Value(f64),
    Token(String),
}

/// A single `COMPONENT` declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_exact: Option<f64>,
    /// Only meaningful alongside `height_exact`.
    pub height_tolerance: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_exact: Option<f64>,
    /// Only meaningful alongside `size_exact`.
    pub size_tolerance: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub touch_target: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<CornerRadius>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_h: Option<f64>,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Numeric value of a property, if declared.
    ///
    /// A corner radius given as a token has no numeric value.
    pub fn value(&self, property: Property) -> Option<f64> {
        match property {
            Property::HeightMin => self.height_min,
            Property::HeightExact => self.height_exact,
            Property::SizeExact => self.size_exact,
            Property::TouchTarget => self.touch_target,
            Property::CornerRadius => match &self.corner_radius {
                Some(CornerRadius::Value(v)) => Some(*v),
                _ => None,
            },
            Property::TrackHeight => self.track_height,
            Property::TrackWidth => self.track_width,
            Property::ThumbSize => self.thumb_size,
            Property::IconSize => self.icon_size,
            Property::PaddingH => self.padding_h,
        }
    }

    /// Number of properties that were set by the DSL (tolerances excluded).
    pub fn declared_count(&self) -> usize {
        let numeric = Property::ALL
            .iter()
            .filter(|p| **p != Property::CornerRadius && self.value(**p).is_some())
            .count();
        numeric + usize::from(self.corner_radius.is_some())
    }
}

/// Properties that can be referenced by name, e.g. from an invariant table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    HeightMin,
    HeightExact,
    SizeExact,
    TouchTarget,
    CornerRadius,
    TrackHeight,
    TrackWidth,
    ThumbSize,
    IconSize,
    PaddingH,
}

impl Property {
    pub const ALL: [Property; 10] = [
        Property::HeightMin,
        Property::HeightExact,
        Property::SizeExact,
        Property::TouchTarget,
        Property::CornerRadius,
        Property::TrackHeight,
        Property::TrackWidth,
        Property::ThumbSize,
        Property::IconSize,
        Property::PaddingH,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Property::HeightMin => "height_min",
            Property::HeightExact => "height_exact",
            Property::SizeExact => "size_exact",
            Property::TouchTarget => "touch_target",
            Property::CornerRadius => "corner_radius",
            Property::TrackHeight => "track_height",
            Property::TrackWidth => "track_width",
            Property::ThumbSize => "thumb_size",
            Property::IconSize => "icon_size",
            Property::PaddingH => "padding_h",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown property '{0}'")]
pub struct UnknownProperty(pub String);

impl FromStr for Property {
    type Err = UnknownProperty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Property::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownProperty(s.to_string()))
    }
}

/// Top-level parse result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecDocument {
    pub components: BTreeMap<String, ComponentSpec>,
    pub grid_unit: f64,
    /// Lines that matched no statement or property rule.
    pub ignored_lines: usize,
}

impl Default for SpecDocument {
    fn default() -> Self {
        Self {
            components: BTreeMap::new(),
            grid_unit: DEFAULT_GRID_UNIT,
            ignored_lines: 0,
        }
    }
}

impl SpecDocument {
    pub fn component(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_names_round_trip() {
        for property in Property::ALL {
            let parsed: Property = property.as_str().parse().expect("known property");
            assert_eq!(parsed, property);
        }
        assert!("min_width".parse::<Property>().is_err());
    }

    #[test]
    fn token_corner_radius_has_no_numeric_value() {
        let mut spec = ComponentSpec::new("search_bar");
        spec.corner_radius = Some(CornerRadius::Token("full".into()));
        assert_eq!(spec.value(Property::CornerRadius), None);
        assert_eq!(spec.declared_count(), 1);

        spec.corner_radius = Some(CornerRadius::Value(28.0));
        assert_eq!(spec.value(Property::CornerRadius), Some(28.0));
    }

    #[test]
    fn empty_component_declares_nothing() {
        let spec = ComponentSpec::new("divider");
        assert_eq!(spec.declared_count(), 0);
        assert_eq!(spec.height_tolerance, 0);
        assert_eq!(spec.size_tolerance, 0);
    }

    #[test]
    fn default_document_uses_grid_unit_four() {
        let doc = SpecDocument::default();
        assert!(doc.is_empty());
        assert!((doc.grid_unit - 4.0).abs() < f64::EPSILON);
    }
}
