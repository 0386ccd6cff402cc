//! Command implementations

mod fix;
mod lint;
mod lsp;

pub use fix::run_fix;
pub use lint::run_lint;
pub use lsp::run_lsp;
