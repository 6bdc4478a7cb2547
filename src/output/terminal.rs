//! Terminal output with colors and box drawing.

use colored::Colorize;

use crate::result::{EstimationReport, StopReason};

/// Measurements listed at the end of the report.
const RECENT_SHOTS: usize = 5;

/// Format a report for the terminal.
pub fn format_report(report: &EstimationReport) -> String {
    let mut output = String::new();

    let header = match report.stop_reason {
        StopReason::TargetVariance => format!(
            "{} {}",
            "\u{2713}".green().bold(),
            "CONVERGED".green().bold()
        ),
        StopReason::MeasurementBudget => format!(
            "{} {}",
            "\u{26A0}".yellow().bold(),
            "BUDGET SPENT".yellow().bold()
        ),
    };

    output.push_str(&format_box_top());
    output.push_str(&format_box_line(&header));
    output.push_str(&format_box_separator());

    output.push_str(&format_box_line(&format!(
        "Estimate: {:.6} rad (\u{00B1} {:.2e})",
        report.estimate,
        report.std_dev()
    )));
    output.push_str(&format_box_line(&format!(
        "Peak:     {:.6} rad",
        report.peak_estimate
    )));
    output.push_str(&format_box_line(&format!(
        "Variance: {:.3e}",
        report.variance
    )));
    output.push_str(&format_box_line(&format!(
        "Measurements: {} ({} repetitions)",
        report.measurements, report.total_repetitions
    )));

    if !report.history.is_empty() {
        output.push_str(&format_box_separator());
        let start = report.history.len().saturating_sub(RECENT_SHOTS);
        for shot in &report.history[start..] {
            let line = format!(
                "#{:<4} k={:<3} \u{03B8}={:.4} -> {:?}",
                shot.index, shot.k, shot.angle, shot.outcome
            );
            output.push_str(&format_box_line(&line.dimmed().to_string()));
        }
    }

    output.push_str(&format_box_bottom());
    output
}

// Box drawing

const BOX_WIDTH: usize = 60;

fn format_box_top() -> String {
    format!("\u{250C}{}\u{2510}\n", "\u{2500}".repeat(BOX_WIDTH))
}

fn format_box_bottom() -> String {
    format!("\u{2514}{}\u{2518}\n", "\u{2500}".repeat(BOX_WIDTH))
}

fn format_box_separator() -> String {
    format!("\u{251C}{}\u{2524}\n", "\u{2500}".repeat(BOX_WIDTH))
}

fn format_box_line(content: &str) -> String {
    let visible = strip_ansi_codes(content).chars().count();
    let padding = (BOX_WIDTH - 2).saturating_sub(visible);
    format!("\u{2502} {}{} \u{2502}\n", content, " ".repeat(padding))
}

fn strip_ansi_codes(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}
