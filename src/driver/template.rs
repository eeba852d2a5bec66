//! C source synthesis for the conformance programs.

use crate::types::ComplianceCheck;

use super::cases::TestCase;

const UNIFIED_TEMPLATE: &str = r#"
#include <stdio.h>
#include <stdlib.h>
#include <stdbool.h>
#include <string.h>
#include "iui.h"
#include "ports/port.h"
#include "ports/headless.h"

static uint8_t buffer[65536];

/* Test state */
{STATE_VARS}
static int test_passed = 0;

int main(int argc, char **argv) {
    const char *png = argc > 1 ? argv[1] : NULL;

    iui_port_ctx *port = g_iui_port.init(400, 300, "Test");
    if (!port) { fprintf(stderr, "port init failed\n"); return 1; }

    g_iui_port.configure(port);
    iui_headless_set_max_frames(port, 10);

    iui_config_t cfg = iui_make_config(buffer,
        g_iui_port.get_renderer_callbacks(port), 14.0f,
        g_iui_port.get_vector_callbacks(port));
    iui_context *ctx = iui_init(&cfg);
    if (!ctx) { fprintf(stderr, "ctx init failed\n"); g_iui_port.shutdown(port); return 1; }

    unsigned long frame = 0;
    while (g_iui_port.poll_events(port)) {
        frame = iui_headless_get_frame_count(port);

        /* Input injection */
        {INJECT_CODE}

        iui_port_input in;
        g_iui_port.get_input(port, &in);
        iui_port_apply_input(ctx, &in);

        g_iui_port.begin_frame(port);
        iui_begin_frame(ctx, g_iui_port.get_delta_time(port));
        iui_begin_window(ctx, "Test", 10, 10, 380, 280, 0);

        {WIDGET_CODE}

        iui_end_window(ctx);
        iui_end_frame(ctx);
        g_iui_port.end_frame(port);

        /* Validation */
        {VALIDATE_CODE}
    }

    iui_headless_stats_t st;
    iui_headless_get_stats(port, &st);
    printf("frames:%lu\n", st.frame_count);
    printf("box:%u\n", st.draw_box_calls);
    printf("passed:%d\n", test_passed);
    if (png && iui_headless_save_screenshot(port, png)) printf("saved:%s\n", png);
    g_iui_port.shutdown(port);
    return test_passed ? 0 : 1;
}
"#;

const COMPLIANCE_TEMPLATE: &str = r#"
#include <stdio.h>
#include <stdlib.h>
#include "iui.h"
#include "iui-spec.h"
#include "md3-validate.h"
#include "md3-validate-gen.inc"
#include "ports/port.h"
#include "ports/headless.h"

static uint8_t buffer[65536];

static int violations = 0;
static const float scale = 1.0f;

static void check(const char *name, int result) {
    if (result != 0) {
        printf("FAIL:%s:0x%x\n", name, result);
        violations++;
    } else {
        printf("OK:%s\n", name);
    }
}

int main(int argc, char **argv) {
    (void)argc; (void)argv;
    iui_port_ctx *port = g_iui_port.init(400, 300, "MD3 Test");
    if (!port) { fprintf(stderr, "port init failed\n"); return 1; }

    g_iui_port.configure(port);
    iui_headless_set_max_frames(port, 1);

    iui_config_t cfg = iui_make_config(buffer,
        g_iui_port.get_renderer_callbacks(port), 14.0f,
        g_iui_port.get_vector_callbacks(port));
    iui_context *ctx = iui_init(&cfg);
    if (!ctx) { fprintf(stderr, "ctx init failed\n"); g_iui_port.shutdown(port); return 1; }

    /* Static dimension checks against iui-spec.h */
{CHECKS}

    printf("violations:%d\n", violations);
    g_iui_port.shutdown(port);
    return violations > 0 ? 1 : 0;
}
"#;

const RUNTIME_SOURCE: &str = r#"
#include <stdio.h>
#include <stdlib.h>
#include "iui.h"
#include "src/internal.h"
#include "ports/port.h"
#include "ports/headless.h"

static uint8_t buffer[65536];

int main(int argc, char **argv) {
    (void)argc; (void)argv;
    iui_port_ctx *port = g_iui_port.init(600, 600, "MD3 Runtime Test");
    if (!port) { fprintf(stderr, "port init failed\n"); return 1; }

    g_iui_port.configure(port);
    iui_headless_set_max_frames(port, 3);

    iui_config_t cfg = iui_make_config(buffer,
        g_iui_port.get_renderer_callbacks(port), 14.0f,
        g_iui_port.get_vector_callbacks(port));
    iui_context *ctx = iui_init(&cfg);
    if (!ctx) { fprintf(stderr, "ctx init failed\n"); g_iui_port.shutdown(port); return 1; }

    /* 56dp rows keep every widget above the 48dp touch target */
    ctx->row_height = 56.0f;

    int total_violations = 0;
    int total_tracked = 0;

    while (g_iui_port.poll_events(port)) {
        iui_port_input in;
        g_iui_port.get_input(port, &in);
        iui_port_apply_input(ctx, &in);

        g_iui_port.begin_frame(port);
        iui_begin_frame(ctx, g_iui_port.get_delta_time(port));
        iui_md3_frame_begin(1.0f);
        iui_begin_window(ctx, "Test", 10, 10, 580, 580, 0);

        iui_button(ctx, "Test Button", IUI_ALIGN_LEFT);
        iui_newline(ctx);

        static bool checked = false;
        iui_checkbox(ctx, "Checkbox", &checked);
        iui_newline(ctx);

        static bool sw = false;
        iui_switch(ctx, "Switch", &sw, NULL, NULL);
        iui_newline(ctx);

        static char text[64] = "Hello";
        static size_t cursor = 5;
        iui_textfield(ctx, text, sizeof(text), &cursor, NULL);
        iui_newline(ctx);

        static float slider_value = 25.f;
        slider_value = iui_slider_ex(ctx, slider_value, 0.f, 100.f, 1.f,
            &(iui_slider_options){.value_format = "%.0f"});

        static int tab_index = 0;
        static const char *tab_labels[] = {"One", "Two", "Three"};
        tab_index = iui_tabs(ctx, tab_index, 3, tab_labels);

        static int radio_sel = 0;
        iui_radio(ctx, "Radio A", &radio_sel, 0);
        iui_radio(ctx, "Radio B", &radio_sel, 1);

        static const char *seg_entries[] = {"One", "Two", "Three"};
        static uint32_t seg_selected = 0;
        iui_segmented(ctx, seg_entries, 3, &seg_selected);

        static bool chip_selected = false;
        iui_chip_filter(ctx, "Filter Chip", &chip_selected);

        iui_fab(ctx, 60.f, 420.f, "add");
        iui_fab_large(ctx, 160.f, 420.f, "edit");

        iui_end_window(ctx);
        iui_end_frame(ctx);
        g_iui_port.end_frame(port);

        int frame_violations = iui_md3_get_violations();
        int frame_tracked = iui_md3_get_tracked_count();
        total_violations += frame_violations;
        total_tracked = frame_tracked;

        /* report details for the first offending frame only */
        if (frame_violations > 0 && total_violations == frame_violations) {
            static const char *type_names[] = {
                "BUTTON", "FAB", "FAB_LARGE", "CHIP", "TEXTFIELD",
                "SWITCH", "SLIDER", "TAB", "CHECKBOX", "RADIO", "SEGMENTED"
            };
            static const char *viol_names[] = {
                "HEIGHT", "WIDTH", "TOUCH_TARGET", "CORNER_RADIUS"
            };
            for (int i = 0; i < frame_tracked; i++) {
                const iui_md3_tracked_t *t = iui_md3_get_tracked(i);
                if (t && t->violations != 0) {
                    const char *tname = (t->type < 11) ? type_names[t->type] : "UNKNOWN";
                    printf("  VIOLATION: %s size=%.0fx%.0f ", tname, t->bounds.width, t->bounds.height);
                    for (int v = 0; v < 4; v++) {
                        if (t->violations & (1 << v)) printf("[%s] ", viol_names[v]);
                    }
                    printf("\n");
                }
            }
        }
    }

    printf("tracked:%d\n", total_tracked);
    printf("violations:%d\n", total_violations);
    g_iui_port.shutdown(port);
    return (total_tracked > 0) ? 0 : 1;
}
"#;

const IPC_SMOKE_SOURCE: &str = r#"
#include <stdio.h>
#include <string.h>
#include "include/iui.h"
#include "ports/port.h"
#include "ports/headless.h"
#include "ports/headless-shm.h"

static uint8_t buffer[64 * 1024];

#define EXPECT(name, cond)                  \
    do {                                    \
        tests_total++;                      \
        if (cond) {                         \
            printf("PASS: " name "\n");     \
            tests_passed++;                 \
        } else {                            \
            printf("FAIL: " name "\n");     \
        }                                   \
    } while (0)

int main(void) {
    int tests_passed = 0;
    int tests_total = 0;

    iui_port_ctx *port = g_iui_port.init(400, 300, "SHM Test");
    if (!port) { fprintf(stderr, "port init failed\n"); return 1; }

    g_iui_port.configure(port);
    iui_headless_set_max_frames(port, 5);

    EXPECT("shm_disabled_initially", !iui_headless_shm_enabled(port));

    tests_total++;
    if (iui_headless_enable_shm(port, "/libiui_self_test")) {
        printf("PASS: shm_enable\n");
        tests_passed++;
    } else {
        printf("FAIL: shm_enable\n");
        g_iui_port.shutdown(port);
        return 1;
    }

    EXPECT("shm_is_enabled", iui_headless_shm_enabled(port));

    iui_shm_header_t *hdr = iui_headless_get_shm_header(port);
    EXPECT("header_magic", hdr && hdr->magic == IUI_SHM_MAGIC);
    EXPECT("header_version", hdr && hdr->version == IUI_SHM_VERSION);
    EXPECT("dimensions", hdr && hdr->width == 400 && hdr->height == 300);
    EXPECT("running_flag", hdr && hdr->running);

    iui_config_t cfg = iui_make_config(buffer,
        g_iui_port.get_renderer_callbacks(port), 14.0f,
        g_iui_port.get_vector_callbacks(port));
    iui_context *ctx = iui_init(&cfg);
    if (!ctx) {
        fprintf(stderr, "ctx init failed\n");
        iui_headless_disable_shm(port);
        g_iui_port.shutdown(port);
        return 1;
    }

    while (g_iui_port.poll_events(port)) {
        g_iui_port.begin_frame(port);
        iui_begin_frame(ctx, g_iui_port.get_delta_time(port));
        iui_begin_window(ctx, "main", 10, 10, 380, 280, 0);
        iui_button(ctx, "Test Button", 0);
        iui_end_window(ctx);
        iui_end_frame(ctx);
        g_iui_port.end_frame(port);
        if (g_iui_port.should_exit(port)) break;
    }

    EXPECT("frame_count", hdr && hdr->frame_count >= 4);
    EXPECT("stats_sync", hdr && hdr->draw_box_calls > 0);

    size_t fb_w = 0, fb_h = 0;
    iui_headless_get_framebuffer_size(port, &fb_w, &fb_h);
    const uint32_t *fb = iui_headless_get_framebuffer(port);
    EXPECT("framebuffer_api", fb && fb_w == 400 && fb_h == 300);

    /* the background colour is never fully transparent black */
    EXPECT("get_pixel", iui_headless_get_pixel(port, 0, 0) != 0);

    iui_headless_disable_shm(port);
    EXPECT("shm_disable", !iui_headless_shm_enabled(port));

    g_iui_port.shutdown(port);

    printf("RESULT: %d/%d tests passed\n", tests_passed, tests_total);
    return (tests_passed == tests_total) ? 0 : 1;
}
"#;

/// Source for one unified case. Missing injection becomes `(void)frame;`
/// and missing validation becomes an unconditional pass.
pub fn unified_source(case: &TestCase) -> String {
    let inject = if case.inject_code.is_empty() {
        "(void)frame;"
    } else {
        case.inject_code
    };
    let validate = if case.validate_code.is_empty() {
        "test_passed = 1;"
    } else {
        case.validate_code
    };

    UNIFIED_TEMPLATE
        .replace("{STATE_VARS}", case.state_vars)
        .replace("{INJECT_CODE}", inject)
        .replace("{WIDGET_CODE}", case.code)
        .replace("{VALIDATE_CODE}", validate)
}

pub fn compliance_source(checks: &[ComplianceCheck]) -> String {
    let body = checks
        .iter()
        .map(|check| format!("    {}", check.to_c_statement()))
        .collect::<Vec<_>>()
        .join("\n");
    COMPLIANCE_TEMPLATE.replace("{CHECKS}", &body)
}

pub fn runtime_source() -> &'static str {
    RUNTIME_SOURCE
}

pub fn ipc_smoke_source() -> &'static str {
    IPC_SMOKE_SOURCE
}
