//! Configuration file support.
//!
//! Settings are stored as versioned JSON. Every field has a default, so a
//! partial file only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CLOSE_HANDLE_HOVER_SCALE, DEFAULT_MAX_FILE_SIZE_MB, DEFAULT_STAGE_HEIGHT, DEFAULT_STAGE_WIDTH,
    DEFAULT_ZOOM_OFFSET, VERTEX_RADIUS,
};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }

    /// One step more verbose, saturating at `Trace`.
    pub fn more_verbose(&self) -> LogLevel {
        match self {
            LogLevel::Error => LogLevel::Warn,
            LogLevel::Warn => LogLevel::Info,
            LogLevel::Info => LogLevel::Debug,
            LogLevel::Debug | LogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration that can be exported and imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Application name (for identification)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,

    /// Annotation surface settings
    #[serde(default)]
    pub canvas: CanvasConfig,
}

fn default_app_name() -> String {
    "polyzone".to_string()
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Annotation surface settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Width an ingested image is fitted to
    pub stage_width: f32,
    /// Stage height shown while no image is loaded
    pub stage_height: f32,
    /// Radius of the vertex handles
    pub vertex_radius: f32,
    /// Scale of the first-vertex handle while hovering it can close the polygon
    pub close_handle_scale: f32,
    /// Zoom step (zoom in uses `1 + offset`, zoom out `1 - offset`)
    pub zoom_offset: f32,
    /// Upload size limit in megabytes
    pub max_file_size_mb: u64,
}

impl CanvasConfig {
    /// Upload size limit in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            stage_width: DEFAULT_STAGE_WIDTH,
            stage_height: DEFAULT_STAGE_HEIGHT,
            vertex_radius: VERTEX_RADIUS,
            close_handle_scale: CLOSE_HANDLE_HOVER_SCALE,
            zoom_offset: DEFAULT_ZOOM_OFFSET,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            preferences: UserPreferences::default(),
            canvas: CanvasConfig::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "polyzone-config.json"
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("polyzone").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("polyzone")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from a file.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Returns None if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return None;
        }

        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to a file, creating parent directories as needed.
    pub fn save(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trip() {
        let config = AppConfig::new();
        let json = config.to_json().unwrap();
        let parsed = AppConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "version": 1, "canvas": { "stage_width": 1024.0 } }"#;
        let config = AppConfig::from_json(json).unwrap();
        assert_eq!(config.app_name, "polyzone");
        assert_eq!(config.canvas.stage_width, 1024.0);
        assert_eq!(config.canvas.stage_height, DEFAULT_STAGE_HEIGHT);
        assert_eq!(config.canvas.max_file_size_mb, DEFAULT_MAX_FILE_SIZE_MB);
        assert_eq!(config.preferences.log_level, LogLevel::Info);
    }

    #[test]
    fn test_version_too_new() {
        let json = r#"{ "version": 99 }"#;
        assert!(matches!(
            AppConfig::from_json(json),
            Err(ConfigError::VersionTooNew {
                file_version: 99,
                ..
            })
        ));
    }

    #[test]
    fn test_log_level_names() {
        let prefs: UserPreferences = serde_json::from_str(r#"{ "log_level": "debug" }"#).unwrap();
        assert_eq!(prefs.log_level, LogLevel::Debug);
        assert_eq!(prefs.log_level.to_level_filter(), log::LevelFilter::Debug);
        assert_eq!(LogLevel::Trace.more_verbose(), LogLevel::Trace);
    }

    #[test]
    fn test_max_file_size_bytes() {
        let canvas = CanvasConfig::default();
        assert_eq!(canvas.max_file_size_bytes(), 100 * 1024 * 1024);
    }
}
