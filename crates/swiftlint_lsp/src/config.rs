//! Configuration management for LSP server.

use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, warn};

use swiftlint_core::{SETTINGS_SECTION, Settings, workspace_has_config};

/// Reads settings from `initializationOptions` or a configuration change.
///
/// Accepts the bare settings object or one nested under `"swiftlint"`.
/// Returns `None` when the value carries no settings for this server.
pub fn settings_from_value(value: &Value) -> Option<Settings> {
    let object = value.as_object()?;
    let section = match object.get(SETTINGS_SECTION) {
        Some(nested) => nested.clone(),
        None if looks_like_settings(value) => value.clone(),
        None => return None,
    };

    match serde_json::from_value(section) {
        Ok(settings) => Some(settings),
        Err(e) => {
            warn!("Ignoring invalid SwiftLint settings: {}", e);
            None
        }
    }
}

/// Returns true if a `workspace/didChangeConfiguration` payload concerns
/// this server.
pub fn affects_settings(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.contains_key(SETTINGS_SECTION))
        || looks_like_settings(value)
}

fn looks_like_settings(value: &Value) -> bool {
    let Some(object) = value.as_object() else {
        return false;
    };
    let keys = known_keys();
    !object.is_empty() && object.keys().all(|key| keys.contains_key(key))
}

/// Decides whether the server lints at all.
pub fn should_activate(settings: &Settings, folders: &[PathBuf]) -> bool {
    if !settings.enable {
        debug!("SwiftLint disabled by settings");
        return false;
    }
    if settings.only_enable_with_config {
        let found = folders.iter().any(|folder| workspace_has_config(folder));
        if !found {
            debug!("No SwiftLint configuration in the workspace");
        }
        return found;
    }
    true
}

/// The camelCase keys of [`Settings`].
fn known_keys() -> serde_json::Map<String, Value> {
    match serde_json::to_value(Settings::default()) {
        Ok(Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_settings_from_namespaced_value() {
        let value = json!({
            "swiftlint": {
                "path": "/opt/bin/swiftlint",
                "lintOnType": true
            }
        });

        let settings = settings_from_value(&value).unwrap();
        assert_eq!(settings.path, "/opt/bin/swiftlint");
        assert!(settings.lint_on_type);
        assert!(settings.enable);
    }

    #[test]
    fn test_settings_from_bare_value() {
        let value = json!({ "enable": false, "verboseLogging": true });

        let settings = settings_from_value(&value).unwrap();
        assert!(!settings.enable);
        assert!(settings.verbose_logging);
    }

    #[test]
    fn test_unrelated_values() {
        assert_eq!(settings_from_value(&json!({ "editor": { "tabSize": 4 } })), None);
        assert_eq!(settings_from_value(&Value::Null), None);
        assert_eq!(settings_from_value(&json!({})), None);

        assert!(!affects_settings(&json!({ "editor": {} })));
        assert!(affects_settings(&json!({ "swiftlint": {} })));
        assert!(affects_settings(&json!({ "lintOnSave": false })));
    }

    #[test]
    fn test_should_activate() {
        let dir = tempfile::tempdir().unwrap();
        let folders = vec![dir.path().to_path_buf()];

        assert!(should_activate(&Settings::default(), &folders));

        let disabled = Settings {
            enable: false,
            ..Default::default()
        };
        assert!(!should_activate(&disabled, &folders));

        let gated = Settings {
            only_enable_with_config: true,
            ..Default::default()
        };
        assert!(!should_activate(&gated, &folders));

        std::fs::create_dir(dir.path().join("App")).unwrap();
        std::fs::write(dir.path().join("App/.swiftlint.yaml"), "").unwrap();
        assert!(should_activate(&gated, &folders));
    }
}
