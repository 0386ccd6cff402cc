//! Text output formatter

use swiftlint_core::{Diagnostic, Severity};

use super::FileReport;

pub fn output_text(reports: &[FileReport]) {
    for report in reports {
        for diag in &report.diagnostics {
            println!("{}", format_line(&report.path.display().to_string(), diag));
        }
    }

    let total_files = reports.iter().filter(|r| !r.diagnostics.is_empty()).count();
    let total_issues: usize = reports.iter().map(|r| r.diagnostics.len()).sum();
    println!();
    println!("Found {} issue(s) in {} file(s)", total_issues, total_files);
}

/// `path:line:col: severity: message (rule)`, with 1-based positions.
fn format_line(path: &str, diag: &Diagnostic) -> String {
    let severity = match diag.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    format!(
        "{}:{}:{}: {}: {} ({})",
        path,
        diag.start.line + 1,
        diag.start.character + 1,
        severity,
        diag.message,
        diag.rule_id
    )
}
