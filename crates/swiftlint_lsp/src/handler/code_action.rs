//! Code action handler for quick fixes.

use std::collections::HashMap;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tracing::debug;

use swiftlint_core::DIAGNOSTIC_SOURCE;

use super::commands::FIX_DOCUMENT;
use crate::conversion::rule_id;
use crate::state::SharedState;

/// Code action kind of the "fix all" source action.
pub const FIX_ALL_KIND: &str = "source.fixAll.swiftlint";

/// Comment directive that silences a rule on the following line.
pub const DISABLE_NEXT_LINE: &str = "// swiftlint:disable:next";

/// Handles the `textDocument/codeAction` request.
pub async fn handle_code_action(
    state: &SharedState,
    params: CodeActionParams,
) -> Result<Option<CodeActionResponse>> {
    debug!("Code action request: {}", params.text_document.uri);

    let uri = &params.text_document.uri;
    let diagnostics: Vec<&Diagnostic> = params
        .context
        .diagnostics
        .iter()
        .filter(|d| d.source.as_deref() == Some(DIAGNOSTIC_SOURCE))
        .collect();
    if diagnostics.is_empty() {
        return Ok(None);
    }

    let only = params.context.only.as_deref();
    let mut actions = Vec::new();

    if is_requested(only, &CodeActionKind::QUICKFIX) {
        let text = document_text(state, uri);
        for diag in &diagnostics {
            actions.push(fix_issue_action(uri, diag));
            if let Some(action) = disable_rule_action(uri, diag, &text) {
                actions.push(action);
            }
        }
    }

    let fix_all = CodeActionKind::new(FIX_ALL_KIND);
    if is_requested(only, &fix_all) {
        actions.push(CodeActionOrCommand::CodeAction(CodeAction {
            title: "Fix all SwiftLint issues".to_string(),
            kind: Some(fix_all),
            command: Some(fix_document_command(uri)),
            ..Default::default()
        }));
    }

    Ok(Some(actions))
}

/// Whether `kind` passes the request's `only` filter.
///
/// A requested kind also admits its sub-kinds, so `source.fixAll` matches
/// `source.fixAll.swiftlint`.
fn is_requested(only: Option<&[CodeActionKind]>, kind: &CodeActionKind) -> bool {
    let Some(only) = only else {
        return true;
    };
    let kind = kind.as_str();
    only.iter().any(|requested| {
        let requested = requested.as_str();
        kind == requested
            || kind
                .strip_prefix(requested)
                .is_some_and(|rest| rest.starts_with('.'))
    })
}

fn fix_document_command(uri: &Url) -> Command {
    Command {
        title: "Fix document".to_string(),
        command: FIX_DOCUMENT.to_string(),
        arguments: Some(vec![serde_json::Value::String(uri.to_string())]),
    }
}

fn fix_issue_action(uri: &Url, diag: &Diagnostic) -> CodeActionOrCommand {
    CodeActionOrCommand::CodeAction(CodeAction {
        title: "Fix this SwiftLint issue".to_string(),
        kind: Some(CodeActionKind::QUICKFIX),
        diagnostics: Some(vec![diag.clone()]),
        command: Some(fix_document_command(uri)),
        ..Default::default()
    })
}

fn disable_rule_action(uri: &Url, diag: &Diagnostic, text: &str) -> Option<CodeActionOrCommand> {
    let rule = rule_id(diag)?;
    let line = diag.range.start.line;
    let indent = leading_whitespace(text, line);

    let edit = TextEdit {
        range: Range::new(Position::new(line, 0), Position::new(line, 0)),
        new_text: format!("{}{} {}\n", indent, DISABLE_NEXT_LINE, rule),
    };

    Some(CodeActionOrCommand::CodeAction(CodeAction {
        title: format!("Disable rule: {}", rule),
        kind: Some(CodeActionKind::QUICKFIX),
        diagnostics: Some(vec![diag.clone()]),
        edit: Some(WorkspaceEdit {
            changes: Some(HashMap::from([(uri.clone(), vec![edit])])),
            ..Default::default()
        }),
        ..Default::default()
    }))
}

/// Open buffer contents, else the file on disk, else nothing.
fn document_text(state: &SharedState, uri: &Url) -> String {
    state
        .document_text(uri)
        .or_else(|| {
            let path = uri.to_file_path().ok()?;
            std::fs::read_to_string(path).ok()
        })
        .unwrap_or_default()
}

fn leading_whitespace(text: &str, line: u32) -> &str {
    let Some(content) = text.lines().nth(line as usize) else {
        return "";
    };
    let end = content
        .find(|c: char| !c.is_whitespace())
        .unwrap_or(content.len());
    &content[..end]
}
