//! Settings store for persisting [`ExtensionSettings`] as YAML.

use crate::settings::ExtensionSettings;
use naix_core::{AppError, AppResult};
use std::path::Path;

/// Load extension settings from a YAML file.
///
/// A missing file yields the defaults. Keys missing from the document are
/// backfilled from the defaults, so older files keep loading.
///
/// # Example
/// ```no_run
/// use naix_prompt::load_settings;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = load_settings(Path::new(".naix/settings.yaml"))?;
/// println!("{} text blocks", settings.text_blocks.len());
/// # Ok(())
/// # }
/// ```
pub fn load_settings(path: &Path) -> AppResult<ExtensionSettings> {
    tracing::debug!("Loading settings from: {:?}", path);

    if !path.exists() {
        tracing::debug!("Settings file not found, using defaults");
        return Ok(ExtensionSettings::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Settings(format!("Failed to read settings file {:?}: {}", path, e))
    })?;

    // an empty document deserializes to unit, not a mapping
    if contents.trim().is_empty() {
        return Ok(ExtensionSettings::default());
    }

    let settings: ExtensionSettings = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Settings(format!("Failed to parse settings YAML {:?}: {}", path, e))
    })?;

    if settings.story_string.trim().is_empty() {
        tracing::warn!("Stored story string is empty; the prompt will only carry the cache");
    }

    tracing::info!(
        "Loaded settings ({} text blocks, prune {})",
        settings.text_blocks.len(),
        settings.prune_chat_by
    );

    Ok(settings)
}

/// Write extension settings to a YAML file, creating parent directories.
pub fn save_settings(path: &Path, settings: &ExtensionSettings) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::Settings(format!("Failed to create directory {:?}: {}", parent, e))
        })?;
    }

    let contents = serde_yaml::to_string(settings)?;
    std::fs::write(path, contents).map_err(|e| {
        AppError::Settings(format!("Failed to write settings file {:?}: {}", path, e))
    })?;

    tracing::debug!("Saved settings to: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DEFAULT_STORY_STRING;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = load_settings(&temp_dir.path().join("settings.yaml")).unwrap();
        assert_eq!(settings, ExtensionSettings::default());
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "\n").unwrap();
        assert_eq!(load_settings(&path).unwrap(), ExtensionSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".naix/settings.yaml");

        let mut settings = ExtensionSettings {
            remove_char_and_user: true,
            prune_chat_by: 2,
            story_string: "{{#trim}}{{chat}}{{/trim}}".to_string(),
            ..Default::default()
        };
        settings.add_text_block("lore", "Dragons sleep in winter.").unwrap();

        save_settings(&path, &settings).unwrap();
        assert!(path.exists());

        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_is_backfilled() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "removeLastMentionOfChar: true\npruneChatBy: 4\n").unwrap();

        let settings = load_settings(&path).unwrap();
        assert!(settings.remove_last_mention_of_char);
        assert_eq!(settings.prune_chat_by, 4);
        assert!(!settings.remove_char_and_user);
        assert_eq!(settings.story_string, DEFAULT_STORY_STRING);
    }

    #[test]
    fn test_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "pruneChatBy: [not a number").unwrap();

        let result = load_settings(&path);
        assert!(matches!(result, Err(AppError::Settings(_))));
    }

    #[test]
    fn test_negative_prune_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.yaml");
        fs::write(&path, "pruneChatBy: -1\n").unwrap();

        assert!(load_settings(&path).is_err());
    }
}
