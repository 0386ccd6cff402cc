//! LSP type conversion utilities.

use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::{
    CodeDescription, Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range, Url,
};

use swiftlint_core::{Diagnostic as SwiftLintDiagnostic, Severity as SwiftLintSeverity};

/// Converts a SwiftLint diagnostic to an LSP diagnostic.
pub fn to_lsp_diagnostic(diag: &SwiftLintDiagnostic) -> Diagnostic {
    let severity = match diag.severity {
        SwiftLintSeverity::Error => DiagnosticSeverity::ERROR,
        SwiftLintSeverity::Warning => DiagnosticSeverity::WARNING,
    };

    Diagnostic {
        range: Range::new(
            Position::new(diag.start.line, diag.start.character),
            Position::new(diag.end.line, diag.end.character),
        ),
        severity: Some(severity),
        code: Some(NumberOrString::String(diag.rule_id.clone())),
        code_description: Url::parse(&diag.help_uri)
            .ok()
            .map(|href| CodeDescription { href }),
        source: Some(diag.source.to_string()),
        message: diag.message.clone(),
        ..Default::default()
    }
}

/// Extracts the rule id from an LSP diagnostic produced by this server.
pub fn rule_id(diag: &Diagnostic) -> Option<String> {
    match diag.code.as_ref()? {
        NumberOrString::String(s) => Some(s.clone()),
        NumberOrString::Number(n) => Some(n.to_string()),
    }
}

/// Returns the path of a `file:` URI pointing at a Swift source file.
pub fn swift_document_path(uri: &Url) -> Option<PathBuf> {
    if uri.scheme() != "file" {
        return None;
    }
    let path = uri.to_file_path().ok()?;
    path.extension()
        .is_some_and(|ext| ext == "swift")
        .then_some(path)
}

/// Converts an absolute path to a `file:` URI.
pub fn file_uri(path: &Path) -> Option<Url> {
    Url::from_file_path(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use swiftlint_core::{Violation, to_diagnostic};

    fn sample(severity: &str, character: Option<i64>) -> SwiftLintDiagnostic {
        to_diagnostic(&Violation {
            file: PathBuf::from("/repo/App.swift"),
            line: 10,
            character,
            severity: severity.to_string(),
            rule_id: "line_length".to_string(),
            reason: "Line should be 120 characters or less".to_string(),
            kind: "Line Length".to_string(),
        })
    }

    #[test]
    fn test_to_lsp_diagnostic() {
        let diag = to_lsp_diagnostic(&sample("Error", Some(5)));

        assert_eq!(diag.range, Range::new(Position::new(9, 4), Position::new(9, 4)));
        assert_eq!(diag.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diag.source.as_deref(), Some("swiftlint"));
        assert_eq!(
            diag.code,
            Some(NumberOrString::String("line_length".to_string()))
        );
        assert_eq!(
            diag.code_description.map(|d| d.href.to_string()),
            Some("https://realm.github.io/SwiftLint/line_length.html".to_string())
        );
        assert_eq!(diag.message, "Line should be 120 characters or less");
    }

    #[test]
    fn test_warning_severity() {
        let diag = to_lsp_diagnostic(&sample("Warning", None));
        assert_eq!(diag.severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(diag.range.start, Position::new(9, 0));
    }

    #[test]
    fn test_rule_id() {
        let diag = to_lsp_diagnostic(&sample("Warning", None));
        assert_eq!(rule_id(&diag).as_deref(), Some("line_length"));

        let numeric = Diagnostic {
            code: Some(NumberOrString::Number(42)),
            ..Default::default()
        };
        assert_eq!(rule_id(&numeric).as_deref(), Some("42"));
        assert_eq!(rule_id(&Diagnostic::default()), None);
    }

    #[test]
    fn test_swift_document_path() {
        let dir = tempfile::tempdir().unwrap();
        let swift = dir.path().join("App.swift");
        let markdown = dir.path().join("README.md");

        assert_eq!(
            swift_document_path(&file_uri(&swift).unwrap()),
            Some(swift.clone())
        );
        assert_eq!(swift_document_path(&file_uri(&markdown).unwrap()), None);

        let git = Url::parse("git:/repo/App.swift?ref=HEAD").unwrap();
        assert_eq!(swift_document_path(&git), None);

        let untitled = Url::parse("untitled:Untitled-1").unwrap();
        assert_eq!(swift_document_path(&untitled), None);
    }
}
