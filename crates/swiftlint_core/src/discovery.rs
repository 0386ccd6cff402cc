//! Configuration file discovery.
//!
//! Discovery only decides *whether* a file should be linted. The path found
//! here is never passed to SwiftLint as `--config`; the tool performs its own
//! lookup, and explicit `--config` arguments come from
//! [`Settings::config_search_paths`](crate::Settings::config_search_paths).

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Recognized SwiftLint configuration file names.
pub const CONFIG_FILE_NAMES: &[&str] = &[".swiftlint.yml", ".swiftlint.yaml"];

/// Directories never searched when scanning a workspace.
const SKIPPED_DIRS: &[&str] = &[".git", ".build", "node_modules"];

/// Searches the directory of `file` and every ancestor up to the
/// filesystem root for a configuration file.
///
/// Returns the nearest match. Within one directory, `.swiftlint.yml` wins
/// over `.swiftlint.yaml`.
pub fn find_config_for_file(file: &Path) -> Option<PathBuf> {
    let start = file.parent()?;

    start.ancestors().find_map(|dir| {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// Returns true if `path` names a SwiftLint configuration file.
pub fn is_config_file(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| CONFIG_FILE_NAMES.contains(&name))
}

/// Returns true if a configuration file exists anywhere under `folder`.
pub fn workspace_has_config(folder: &Path) -> bool {
    WalkDir::new(folder)
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry))
        .filter_map(|e| e.ok())
        .any(|entry| entry.file_type().is_file() && is_config_file(entry.path()))
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}
