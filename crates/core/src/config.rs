//! Configuration management for naix.
//!
//! Configuration is merged from several sources, lowest precedence first:
//! - Built-in defaults
//! - Config file (`.naix/config.yaml`, or `NAIX_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The user's formatting settings (policy flags, text blocks, story string)
//! are not part of this struct; they live in the settings file it points at.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// API identifier of the backend the story string targets.
pub const TARGET_API: &str = "novel";

/// Context preset the host must select for unformatted NovelAI output.
pub const DEFAULT_CONTEXT_PRESET: &str = "NovelAI";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .naix/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Optional settings file override
    pub settings_file: Option<PathBuf>,

    /// Currently selected chat-completion API (e.g., "novel", "openai")
    pub main_api: String,

    /// Host state consulted by the advanced-formatting check
    pub formatting: HostFormatting,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// The host's advanced-formatting state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostFormatting {
    /// Name of the selected context template preset
    #[serde(rename = "contextPreset")]
    pub context_preset: String,

    /// Whether instruct mode is enabled
    #[serde(rename = "instructEnabled")]
    pub instruct_enabled: bool,
}

impl Default for HostFormatting {
    fn default() -> Self {
        Self {
            context_preset: DEFAULT_CONTEXT_PRESET.to_string(),
            instruct_enabled: false,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    backend: Option<BackendConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
    #[serde(rename = "settingsFile")]
    settings_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BackendConfig {
    #[serde(rename = "mainApi")]
    main_api: Option<String>,
    #[serde(rename = "contextPreset")]
    context_preset: Option<String>,
    #[serde(rename = "instructEnabled")]
    instruct_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            settings_file: None,
            main_api: TARGET_API.to_string(),
            formatting: HostFormatting::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `NAIX_WORKSPACE`: Override workspace path
    /// - `NAIX_CONFIG`: Path to config file
    /// - `NAIX_API`: Selected chat-completion API
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], with an explicit workspace and config file
    /// taking precedence over `NAIX_WORKSPACE` and `NAIX_CONFIG`.
    pub fn load_with(
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
    ) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace = workspace.or_else(|| env_path("NAIX_WORKSPACE"));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env_path("NAIX_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.naix_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(api) = std::env::var("NAIX_API") {
            config.main_api = api;
        }

        config.log_level = std::env::var("RUST_LOG").ok().or(config.log_level);

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        Ok(self.clone().merge(config_file))
    }

    fn merge(mut self, file: ConfigFile) -> Self {
        if let Some(ws) = file.workspace {
            if let Some(path) = ws.path {
                self.workspace = PathBuf::from(path);
            }
            if let Some(settings) = ws.settings_file {
                self.settings_file = Some(PathBuf::from(settings));
            }
        }

        if let Some(backend) = file.backend {
            if let Some(api) = backend.main_api {
                self.main_api = api;
            }
            if let Some(preset) = backend.context_preset {
                self.formatting.context_preset = preset;
            }
            if let Some(instruct) = backend.instruct_enabled {
                self.formatting.instruct_enabled = instruct;
            }
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        self
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over the environment and the config file.
    pub fn with_overrides(
        mut self,
        main_api: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(api) = main_api {
            self.main_api = api;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .naix directory.
    pub fn naix_dir(&self) -> PathBuf {
        self.workspace.join(".naix")
    }

    /// Path of the YAML file holding the formatting settings.
    pub fn settings_path(&self) -> PathBuf {
        match self.settings_file {
            Some(ref path) if path.is_absolute() => path.clone(),
            Some(ref path) => self.workspace.join(path),
            None => self.naix_dir().join("settings.yaml"),
        }
    }

    /// Whether the selected API is the one the story string targets.
    pub fn is_target_api(&self) -> bool {
        self.main_api == TARGET_API
    }

    /// Validate the merged configuration.
    pub fn validate(&self) -> AppResult<()> {
        if self.main_api.trim().is_empty() {
            return Err(AppError::Config("Selected API cannot be empty".to_string()));
        }

        if self.formatting.context_preset.trim().is_empty() {
            return Err(AppError::Config(
                "Context preset name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.main_api, "novel");
        assert_eq!(config.formatting.context_preset, "NovelAI");
        assert!(!config.formatting.instruct_enabled);
        assert!(!config.verbose);
        assert!(config.is_target_api());
    }

    #[test]
    fn test_settings_path_defaults_into_naix_dir() {
        let config = AppConfig::default();
        assert!(config.settings_path().ends_with(".naix/settings.yaml"));
    }

    #[test]
    fn test_relative_settings_file_resolves_against_workspace() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/tmp/story");
        config.settings_file = Some(PathBuf::from("custom/settings.yaml"));
        assert_eq!(
            config.settings_path(),
            PathBuf::from("/tmp/story/custom/settings.yaml")
        );
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden =
            config.with_overrides(Some("openai".to_string()), None, true, false);

        assert_eq!(overridden.main_api, "openai");
        assert!(!overridden.is_target_api());
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(
            &path,
            r#"
backend:
  mainApi: kobold
  contextPreset: Default
  instructEnabled: true
logging:
  level: warn
  color: false
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.main_api, "kobold");
        assert_eq!(merged.formatting.context_preset, "Default");
        assert!(merged.formatting.instruct_enabled);
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);
    }

    #[test]
    fn test_load_with_reads_workspace_config() {
        let temp_dir = TempDir::new().unwrap();
        let naix_dir = temp_dir.path().join(".naix");
        fs::create_dir_all(&naix_dir).unwrap();
        fs::write(
            naix_dir.join("config.yaml"),
            "workspace:\n  settingsFile: story.yaml\nbackend:\n  contextPreset: Default\n",
        )
        .unwrap();

        let config = AppConfig::load_with(Some(temp_dir.path().to_path_buf()), None).unwrap();
        assert_eq!(config.formatting.context_preset, "Default");
        assert_eq!(config.settings_path(), temp_dir.path().join("story.yaml"));
    }

    #[test]
    fn test_load_with_missing_workspace() {
        let result = AppConfig::load_with(Some(PathBuf::from("/nonexistent/naix/workspace")), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_merge_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "backend: [unclosed").unwrap();

        let result = AppConfig::default().merge_yaml(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_empty_api() {
        let mut config = AppConfig::default();
        config.main_api = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_default() {
        assert!(AppConfig::default().validate().is_ok());
    }
}
