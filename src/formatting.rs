use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use iuic_lib::{
    CaseOutcome, ErrorOutput, HarnessError, HarnessOutput, RunOutput, Suite, OUTPUT_VERSION,
};

use crate::cli::OutputFormat;

/// Column the `[ OK ]` / `[FAIL]` marker starts after.
const WIDTH: usize = 45;

/// Write output in the requested format.
pub fn write_output(
    body: &HarnessOutput,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => write_json_output(body, output.as_deref())?,
        OutputFormat::Pretty => write_pretty_output(body, output.as_deref())?,
    };
    Ok(())
}

/// Write the output, falling back to a fatal error if that fails.
pub fn emit(body: &HarnessOutput, format: OutputFormat, output: Option<PathBuf>, code: ExitCode) -> ExitCode {
    match write_output(body, format, output.clone()) {
        Ok(()) => code,
        Err(err) => render_error(
            HarnessError::Unknown(format!("Failed to write output: {err}")),
            format,
            output,
        ),
    }
}

/// Render an error and return the appropriate exit code.
pub fn render_error(err: HarnessError, format: OutputFormat, output: Option<PathBuf>) -> ExitCode {
    let error_payload = err.to_payload();
    let payload = HarnessOutput::Error(ErrorOutput {
        version: OUTPUT_VERSION.to_string(),
        message: Some(error_payload.message.clone()),
        error: error_payload,
    });

    match format {
        OutputFormat::Json => {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            if let Some(path) = output {
                if let Err(write_err) = std::fs::write(&path, &content) {
                    eprintln!("Failed to write error output: {}", write_err);
                    println!("{content}");
                }
            } else {
                println!("{content}");
            }
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload, output.as_deref()) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    // Exit code 2 is reserved for fatal errors; failing cases use 1.
    ExitCode::from(2)
}

fn write_json_output(body: &HarnessOutput, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string(body)?;
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

fn write_pretty_output(body: &HarnessOutput, output: Option<&Path>) -> io::Result<()> {
    let stdout_is_tty = std::io::stdout().is_terminal();
    let use_human = output.is_none() && stdout_is_tty;

    if use_human {
        let content = format_pretty(body, true);
        print!("{content}");
        return Ok(());
    }

    // Non-tty or file output: keep JSON shape for pipelines/files.
    let content =
        serde_json::to_string_pretty(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".to_string());
    if let Some(path) = output {
        std::fs::write(path, &content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &HarnessOutput, colorize: bool) -> String {
    let mut buf = String::new();
    match body {
        HarnessOutput::Run(out) => format_run(&mut buf, out, colorize),
        HarnessOutput::List(out) => {
            writeln!(buf, "Unified Tests (render + interaction + validation):").ok();
            for case in &out.cases {
                let marker = if case.interactive { "✓" } else { " " };
                writeln!(buf, "  {:12} [{}] {}", case.name, marker, case.description).ok();
            }
            writeln!(buf, "\nMD3 validation: iuic spec").ok();
            writeln!(buf, "[✓] = includes input injection").ok();
        }
        HarnessOutput::Build(out) => {
            let header = color("[BUILD]", "36", colorize);
            writeln!(buf, "{} Build complete: {}", header, out.library.display()).ok();
        }
        HarnessOutput::Clean(out) => {
            if out.removed {
                writeln!(buf, "Cleaned build directory.").ok();
            } else {
                writeln!(buf, "Nothing to clean ({}).", out.build_dir.display()).ok();
            }
        }
        HarnessOutput::Error(out) => {
            let header = color("[ERROR]", "31", colorize);
            let message = out
                .message
                .as_deref()
                .unwrap_or_else(|| out.error.message.as_str());
            writeln!(buf, "{} {}", header, message).ok();
            if let Some(remediation) = &out.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
        }
    }
    buf
}

fn format_run(buf: &mut String, out: &RunOutput, colorize: bool) {
    let rule = "=".repeat(WIDTH + 8);
    writeln!(buf, "{}", out.suite.title()).ok();
    writeln!(buf, "{rule}").ok();

    let mut in_md3_section = out.suite == Suite::Spec;
    for case in &out.cases {
        if out.suite == Suite::All && !in_md3_section && case.name.starts_with("md3-") {
            in_md3_section = true;
            writeln!(buf).ok();
            writeln!(buf, "{}", Suite::Spec.title()).ok();
            writeln!(buf, "{rule}").ok();
        }
        let label = match out.suite {
            Suite::Test => case.name.as_str(),
            _ => case.description.as_str(),
        };
        writeln!(buf, "{}", result_line(label, case, colorize)).ok();
    }

    match out.suite {
        Suite::All | Suite::Visual => {
            let noun = if out.suite == Suite::Visual {
                "visual tests"
            } else {
                "headless tests"
            };
            writeln!(buf).ok();
            writeln!(buf, "{rule}").ok();
            if out.passed {
                writeln!(buf, "  All {} {noun} passed", out.summary.passed).ok();
            } else if out.suite == Suite::Visual {
                writeln!(buf, "  {}/{} {noun} passed", out.summary.passed, out.summary.total).ok();
            } else {
                writeln!(buf, "  {}/{} tests passed", out.summary.passed, out.summary.total).ok();
            }
        }
        Suite::Golden => {
            if let Some(dir) = &out.golden_dir {
                writeln!(buf, "\nGolden images saved to: {}", dir.display()).ok();
            }
        }
        Suite::Test | Suite::Spec | Suite::Ipc => {}
    }
}

/// `<label padded to WIDTH> [ OK ]` or `<label> [FAIL] <reason>`.
fn result_line(label: &str, case: &CaseOutcome, colorize: bool) -> String {
    if case.passed {
        format!("{label:<WIDTH$} [ {} ]", color("OK", "32", colorize))
    } else {
        let reason = case.error_text().unwrap_or_default();
        format!("{label:<WIDTH$} [{}] {reason}", color("FAIL", "31", colorize))
            .trim_end()
            .to_string()
    }
}

/// Apply ANSI color codes when enabled.
fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

/// Exit code for a finished run: 0 when everything passed, 1 otherwise.
pub fn exit_code_for_run(passed: bool) -> ExitCode {
    if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
