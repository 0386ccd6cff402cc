//! User-facing settings.

use serde::{Deserialize, Serialize};

/// Namespace the settings live under in editor configuration.
pub const SETTINGS_SECTION: &str = "swiftlint";

/// Settings controlling when and how SwiftLint runs.
///
/// Every field has a default, so partial objects deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Master switch.
    pub enable: bool,

    /// Executable to run.
    pub path: String,

    /// Explicit configuration files; the first one that exists is passed
    /// as `--config`.
    pub config_search_paths: Vec<String>,

    /// Extra arguments appended to every invocation.
    pub additional_parameters: Vec<String>,

    /// Alternate Swift toolchain. Empty means unset.
    pub toolchain_path: String,

    /// Lint every workspace folder once the server is initialized.
    pub auto_lint_workspace: bool,

    /// Skip files that have no `.swiftlint.yml` above them.
    pub only_enable_with_config: bool,

    /// Lint (debounced) while typing.
    pub lint_on_type: bool,

    /// Lint when a document is saved.
    pub lint_on_save: bool,

    /// Send informational log lines to the editor.
    pub verbose_logging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable: true,
            path: "swiftlint".to_string(),
            config_search_paths: Vec::new(),
            additional_parameters: Vec::new(),
            toolchain_path: String::new(),
            auto_lint_workspace: true,
            only_enable_with_config: false,
            lint_on_type: false,
            lint_on_save: true,
            verbose_logging: false,
        }
    }
}

impl Settings {
    /// Returns the toolchain override, treating the empty string as unset.
    pub fn toolchain(&self) -> Option<&str> {
        if self.toolchain_path.is_empty() {
            None
        } else {
            Some(self.toolchain_path.as_str())
        }
    }
}
