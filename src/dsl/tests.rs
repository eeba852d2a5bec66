use super::*;
use crate::types::CornerRadius;
use proptest::prelude::*;

const MD3_SAMPLE: &str = r#"
# Material Design 3 dimensions
GLOBAL grid_unit 4

GLOBAL state_layer {
  hover 0.08
  pressed 0.12
}

GLOBAL shape {
  none 0
  full 9999
}

COMPONENT button {
  height MIN 40
  touch_target 48
  corner_radius @shape.full
  padding_h 24
}

COMPONENT fab {
  size EXACT 56 ±2
  icon_size 24
  corner_radius 16
}

COMPONENT switch {
  track_width 52
  track_height 32
  thumb_size 24
}
"#;

#[test]
fn parses_md3_sample() {
    let doc = parse(MD3_SAMPLE);

    assert!((doc.grid_unit - 4.0).abs() < f64::EPSILON);
    assert_eq!(doc.components.len(), 3);

    let button = doc.component("button").expect("button parsed");
    assert_eq!(button.height_min, Some(40.0));
    assert_eq!(button.touch_target, Some(48.0));
    assert_eq!(button.padding_h, Some(24.0));
    assert_eq!(
        button.corner_radius,
        Some(CornerRadius::Token("full".to_string()))
    );

    let fab = doc.component("fab").expect("fab parsed");
    assert_eq!(fab.size_exact, Some(56.0));
    assert_eq!(fab.size_tolerance, 2);
    assert_eq!(fab.icon_size, Some(24.0));
    assert_eq!(fab.corner_radius, Some(CornerRadius::Value(16.0)));

    let switch = doc.component("switch").expect("switch parsed");
    assert_eq!(switch.track_width, Some(52.0));
    assert_eq!(switch.track_height, Some(32.0));
    assert_eq!(switch.thumb_size, Some(24.0));
    assert_eq!(doc.ignored_lines, 0);
}

#[test]
fn later_component_declaration_wins() {
    let doc = parse(
        "COMPONENT x {\n  height MIN 10\n  icon_size 18\n}\nCOMPONENT x {\n  height MIN 20\n}\n",
    );

    assert_eq!(doc.components.len(), 1);
    let x = doc.component("x").unwrap();
    assert_eq!(x.height_min, Some(20.0));
    assert_eq!(x.icon_size, None, "redeclaration replaces, never merges");
}

#[test]
fn skip_block_does_not_leak_into_next_component() {
    let doc = parse("GLOBAL shape {\n  corner_radius 999\n}\nCOMPONENT x {\n  corner_radius 12\n}\n");

    let x = doc.component("x").unwrap();
    assert_eq!(x.corner_radius, Some(CornerRadius::Value(12.0)));
    assert_eq!(doc.components.len(), 1);
}

#[test]
fn skip_block_swallows_component_looking_lines() {
    let doc = parse("GLOBAL typography {\n  COMPONENT ghost {\n  height MIN 1\n}\nCOMPONENT real {\n}\n");

    assert!(doc.component("ghost").is_none());
    assert!(doc.component("real").is_some());
}

#[test]
fn closing_skip_block_keeps_enclosing_component_open() {
    let doc = parse("COMPONENT chip {\nGLOBAL state_layer {\n  hover 0.08\n}\nheight MIN 32\n}\n");

    assert_eq!(doc.component("chip").unwrap().height_min, Some(32.0));
}

#[test]
fn tolerance_pairs_with_exact_values() {
    let doc = parse("COMPONENT a {\nheight EXACT 56 ±2\n}\nCOMPONENT b {\nheight EXACT 56\n}\n");

    let a = doc.component("a").unwrap();
    assert_eq!(a.height_exact, Some(56.0));
    assert_eq!(a.height_tolerance, 2);

    let b = doc.component("b").unwrap();
    assert_eq!(b.height_exact, Some(56.0));
    assert_eq!(b.height_tolerance, 0);
}

#[test]
fn restating_exact_without_tolerance_resets_it() {
    let doc = parse("COMPONENT a {\nheight EXACT 56 ±2\nheight EXACT 60\n}\n");

    let a = doc.component("a").unwrap();
    assert_eq!(a.height_exact, Some(60.0));
    assert_eq!(a.height_tolerance, 0);
}

#[test]
fn size_and_height_exact_are_not_confused() {
    let doc = parse("COMPONENT fab {\nsize EXACT 96 ±1\n}\nCOMPONENT nav_bar {\nheight EXACT 80\n}\n");

    let fab = doc.component("fab").unwrap();
    assert_eq!(fab.size_exact, Some(96.0));
    assert_eq!(fab.height_exact, None);
    assert_eq!(fab.size_tolerance, 1);

    let nav = doc.component("nav_bar").unwrap();
    assert_eq!(nav.height_exact, Some(80.0));
    assert_eq!(nav.size_exact, None);
}

#[test]
fn corner_radius_forms_are_mutually_exclusive() {
    let doc = parse("COMPONENT card {\ncorner_radius 12\ncorner_radius @shape.medium\n}\n");

    assert_eq!(
        doc.component("card").unwrap().corner_radius,
        Some(CornerRadius::Token("medium".into()))
    );
}

#[test]
fn component_without_known_properties_is_still_declared() {
    let doc = parse("COMPONENT tooltip {\n  elevation 2\n  color @sys.surface\n}\n");

    let tooltip = doc.component("tooltip").expect("declared component kept");
    assert_eq!(tooltip.declared_count(), 0);
    assert_eq!(doc.ignored_lines, 2);
}

#[test]
fn unclosed_component_is_kept() {
    let doc = parse("COMPONENT tab {\n  height MIN 48");

    assert_eq!(doc.component("tab").unwrap().height_min, Some(48.0));
}

#[test]
fn grid_unit_last_write_wins() {
    let doc = parse("GLOBAL grid_unit 4\nGLOBAL grid_unit 8.5\n");

    assert!((doc.grid_unit - 8.5).abs() < f64::EPSILON);
}

#[test]
fn comments_blank_lines_and_unknown_globals() {
    let doc = parse("\n   # comment\n\nGLOBAL elevation {\nheight MIN 4\n}\n");

    assert!(doc.is_empty());
    // The unknown GLOBAL header and the property outside any component.
    assert_eq!(doc.ignored_lines, 2);
}

#[test]
fn properties_outside_components_are_ignored() {
    let doc = parse("height MIN 40\nCOMPONENT button {\n}\nheight MIN 50\n");

    assert_eq!(doc.component("button").unwrap().height_min, None);
    assert_eq!(doc.ignored_lines, 2);
}

proptest! {
    #[test]
    fn parse_is_total(lines in proptest::collection::vec(".{0,40}", 0..30)) {
        let text = lines.join("\n");
        let doc = parse(&text);
        prop_assert!(doc.grid_unit >= 0.0);
    }

    #[test]
    fn parse_is_total_on_dsl_like_noise(
        lines in proptest::collection::vec(
            prop_oneof![
                Just("COMPONENT x {".to_string()),
                Just("}".to_string()),
                Just("GLOBAL shape {".to_string()),
                Just("height EXACT 56 ±".to_string()),
                Just("size EXACT ±2".to_string()),
                Just("corner_radius @shape.".to_string()),
                "[a-z_ ]{0,12}[0-9.±]{0,6}",
            ],
            0..40,
        )
    ) {
        let doc = parse(&lines.join("\n"));
        for (name, spec) in &doc.components {
            prop_assert_eq!(name, &spec.name);
        }
    }
}
