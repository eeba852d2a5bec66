//! Registry of unified conformance cases.
//!
//! Each case renders a widget through the headless backend, optionally
//! injects input on specific frames and validates the resulting state.

/// One unified case. Empty `inject_code` means render-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestCase {
    pub name: &'static str,
    pub description: &'static str,
    /// File-scope statics shared by the widget and validation code.
    pub state_vars: &'static str,
    pub code: &'static str,
    pub inject_code: &'static str,
    pub validate_code: &'static str,
    /// Minimum `draw_box` calls the backend must report.
    pub min_box_calls: u64,
}

impl TestCase {
    pub fn is_interactive(&self) -> bool {
        !self.inject_code.is_empty()
    }
}

const fn case(name: &'static str, description: &'static str) -> TestCase {
    TestCase {
        name,
        description,
        state_vars: "",
        code: "",
        inject_code: "",
        validate_code: "",
        min_box_calls: 1,
    }
}

static REGISTRY: &[TestCase] = &[
    TestCase {
        state_vars: "static int click_count = 0;",
        code: r#"if (iui_button(ctx, "Click Me", IUI_ALIGN_LEFT)) click_count++;"#,
        inject_code: "if (frame == 1) iui_headless_inject_click(port, 80.0f, 50.0f);",
        validate_code: r#"
        if (frame == 4) {
            test_passed = (click_count >= 1);
            printf("click_count:%d\n", click_count);
        }"#,
        ..case("button", "Button click response")
    },
    TestCase {
        state_vars: "static bool checked = false;",
        code: r#"iui_checkbox(ctx, "Enable", &checked);"#,
        inject_code: "if (frame == 1) iui_headless_inject_click(port, 30.0f, 50.0f);",
        validate_code: r#"
        if (frame == 4) {
            test_passed = checked;
            printf("checked:%d\n", checked);
        }"#,
        ..case("checkbox", "Checkbox toggle")
    },
    TestCase {
        state_vars: "static bool on = false;",
        code: r#"iui_switch(ctx, "Power", &on, NULL, NULL);"#,
        inject_code: "if (frame == 1) iui_headless_inject_click(port, 350.0f, 50.0f);",
        validate_code: r#"
        if (frame == 4) {
            test_passed = on;
            printf("on:%d\n", on);
        }"#,
        ..case("switch", "Switch toggle")
    },
    TestCase {
        state_vars: "static int sel = 0;",
        code: r#"iui_radio(ctx, "Option A", &sel, 0);
        iui_radio(ctx, "Option B", &sel, 1);
        iui_radio(ctx, "Option C", &sel, 2);"#,
        inject_code: "if (frame == 1) iui_headless_inject_click(port, 30.0f, 70.0f);",
        validate_code: r#"
        if (frame == 4) {
            test_passed = (sel == 1);
            printf("sel:%d\n", sel);
        }"#,
        min_box_calls: 3,
        ..case("radio", "Radio selection")
    },
    TestCase {
        state_vars: "static char buf[64] = \"\";\nstatic size_t cur = 0;",
        code: "iui_textfield(ctx, buf, sizeof(buf), &cur, NULL);",
        inject_code: r#"
        if (frame == 1) iui_headless_inject_click(port, 150.0f, 50.0f);
        if (frame == 3) iui_headless_inject_text(port, 'H');
        if (frame == 4) iui_headless_inject_text(port, 'i');"#,
        validate_code: r#"
        if (frame == 7) {
            test_passed = (strlen(buf) >= 2 && buf[0] == 'H' && buf[1] == 'i');
            printf("buf:%s\n", buf);
        }"#,
        ..case("textfield", "Text input")
    },
    TestCase {
        state_vars: "static float val = 0.0f;",
        code: r#"/* slider_ex without a label keeps the track on the first row */
        iui_slider_options opts = {.value_format = "%.0f"};
        val = iui_slider_ex(ctx, val, 0, 100, 1, &opts);"#,
        inject_code: r#"
        if (frame == 1) {
            /* ~50% of the track, vertically centred on the 4dp track */
            iui_headless_inject_click(port, 200.0f, 57.0f);
        }"#,
        validate_code: r#"
        if (frame == 6) {
            /* leave time for the value animation */
            test_passed = (val > 20.0f && val < 80.0f);
            printf("val:%.1f\n", val);
        }"#,
        ..case("slider", "Slider drag")
    },
    TestCase {
        state_vars: "static int active = 0;\nstatic const char *labels[] = {\"One\", \"Two\", \"Three\"};",
        code: "active = iui_tabs(ctx, active, 3, labels);",
        inject_code: r#"
        if (frame == 1) {
            /* second tab, roughly a third of the way across */
            iui_headless_inject_click(port, 180.0f, 50.0f);
        }"#,
        validate_code: r#"
        if (frame == 4) {
            test_passed = (active == 1);
            printf("active:%d\n", active);
        }"#,
        ..case("tabs", "Tab switching")
    },
    TestCase {
        state_vars: "static bool c1 = false, c2 = false;\nstatic int focus_changes = 0;",
        code: r#"iui_checkbox(ctx, "First", &c1);
        iui_checkbox(ctx, "Second", &c2);"#,
        inject_code: r#"
        if (frame == 2) { iui_headless_inject_key(port, IUI_KEY_TAB); focus_changes++; }
        if (frame == 4) { iui_headless_inject_key(port, IUI_KEY_TAB); focus_changes++; }"#,
        validate_code: r#"
        if (frame == 7) {
            test_passed = (focus_changes >= 2);
            printf("focus_changes:%d\n", focus_changes);
        }"#,
        min_box_calls: 2,
        ..case("focus", "Tab key navigation")
    },
    TestCase {
        code: r#"iui_button(ctx, "Above", IUI_ALIGN_LEFT);
        iui_divider(ctx);
        iui_button(ctx, "Below", IUI_ALIGN_LEFT);"#,
        validate_code: "test_passed = 1;",
        min_box_calls: 2,
        ..case("divider", "Divider rendering")
    },
    TestCase {
        code: r#"iui_card_begin(ctx, 20, 20, 340, 100, IUI_CARD_ELEVATED);
        iui_button(ctx, "Inside Card", IUI_ALIGN_LEFT);
        iui_card_end(ctx);"#,
        validate_code: "test_passed = 1;",
        ..case("card", "Card container")
    },
    TestCase {
        code: r#"iui_button(ctx, "Left", IUI_ALIGN_LEFT);
        iui_button(ctx, "Center", IUI_ALIGN_CENTER);
        iui_button(ctx, "Right", IUI_ALIGN_RIGHT);
        iui_newline(ctx);
        iui_button(ctx, "Row 2", IUI_ALIGN_LEFT);"#,
        validate_code: "test_passed = 1;",
        min_box_calls: 4,
        ..case("layout", "Multi-row layout")
    },
    TestCase {
        state_vars: "static iui_scroll_state scroll = {0};",
        code: r#"iui_rect_t vp = iui_scroll_begin(ctx, &scroll, 200, 80);
        (void)vp;
        for (int i = 0; i < 10; i++) {
            char lbl[32]; snprintf(lbl, sizeof(lbl), "Item %d", i);
            iui_button(ctx, lbl, IUI_ALIGN_LEFT);
            iui_newline(ctx);
        }
        iui_scroll_end(ctx, &scroll);"#,
        inject_code: r#"
        if (frame == 2) {
            iui_port_input in = {0};
            in.mouse_x = 100.0f; in.mouse_y = 60.0f;
            in.scroll_y = -30.0f;
            iui_headless_inject_input(port, &in);
        }"#,
        validate_code: r#"
        if (frame == 5) {
            test_passed = (scroll.scroll_y > 0.0f);
            printf("scroll_y:%.1f\n", scroll.scroll_y);
        }"#,
        min_box_calls: 2,
        ..case("scroll", "Scroll wheel input")
    },
];

/// All cases in execution order.
pub fn registry() -> &'static [TestCase] {
    REGISTRY
}

pub fn find(name: &str) -> Option<&'static TestCase> {
    REGISTRY.iter().find(|case| case.name == name)
}
