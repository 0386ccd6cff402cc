//! SwiftLint JSON report parsing.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;

/// Source tag attached to every diagnostic.
pub const DIAGNOSTIC_SOURCE: &str = "swiftlint";

const RULE_DOCS_BASE: &str = "https://realm.github.io/SwiftLint";

/// One entry of `swiftlint lint --reporter json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Violation {
    pub file: PathBuf,
    /// 1-based line.
    pub line: i64,
    /// 1-based column, absent for whole-line violations.
    #[serde(default)]
    pub character: Option<i64>,
    pub severity: String,
    pub rule_id: String,
    pub reason: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    /// Maps the tool's severity string. Anything other than `"Error"` is a
    /// warning.
    pub fn from_reported(severity: &str) -> Self {
        if severity == "Error" {
            Severity::Error
        } else {
            Severity::Warning
        }
    }
}

/// 0-based position in a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A violation normalized for the editor.
///
/// SwiftLint reports points, not spans, so `start == end` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub start: Position,
    pub end: Position,
    pub message: String,
    pub severity: Severity,
    pub source: &'static str,
    pub rule_id: String,
    pub help_uri: String,
}

/// Parses a JSON report, failing on malformed input.
///
/// Empty or whitespace-only input is an empty report.
pub fn try_parse_violations(raw: &str) -> Result<Vec<Violation>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

/// Parses a JSON report, treating malformed input as "no violations".
pub fn parse_violations(raw: &str) -> Vec<Violation> {
    try_parse_violations(raw).unwrap_or_else(|e| {
        debug!("Ignoring unparsable swiftlint output: {}", e);
        Vec::new()
    })
}

/// Converts a violation to a 0-based point diagnostic.
pub fn to_diagnostic(violation: &Violation) -> Diagnostic {
    let line = clamp_to_zero_based(violation.line);
    let character = clamp_to_zero_based(violation.character.unwrap_or(1));
    let position = Position::new(line, character);

    Diagnostic {
        start: position,
        end: position,
        message: violation.reason.clone(),
        severity: Severity::from_reported(&violation.severity),
        source: DIAGNOSTIC_SOURCE,
        rule_id: violation.rule_id.clone(),
        help_uri: rule_doc_url(&violation.rule_id),
    }
}

/// Documentation page for a rule.
pub fn rule_doc_url(rule_id: &str) -> String {
    format!("{}/{}.html", RULE_DOCS_BASE, rule_id)
}

fn clamp_to_zero_based(one_based: i64) -> u32 {
    u32::try_from(one_based.saturating_sub(1).max(0)).unwrap_or(u32::MAX)
}
