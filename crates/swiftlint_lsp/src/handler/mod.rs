//! LSP request/notification handlers.

mod code_action;
mod commands;
mod documents;
mod files;
mod initialize;

pub use code_action::{DISABLE_NEXT_LINE, FIX_ALL_KIND, handle_code_action};
pub use commands::{
    COMMANDS, FIX_DOCUMENT, FIX_WORKSPACE, FORMAT_DOCUMENT, FORMAT_WORKSPACE, LINT_WORKSPACE,
    handle_execute_command,
};
pub use documents::{handle_did_change, handle_did_close, handle_did_open, handle_did_save};
pub use files::handle_did_change_watched_files;
pub use initialize::{
    handle_did_change_configuration, handle_initialize, handle_initialized, handle_shutdown,
};
