//! Editor settings persisted as `config.toml` in the app root.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::audio::AudioOutputConfig;
use crate::interaction::InteractionOptions;
use crate::logging::LoggingOptions;
use crate::track::TrackSettings;

mod load;
mod save;


/// Default filename used to store the editor configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub use load::{config_path, load_from, load_or_default};
pub use save::{save, save_to_path};

/// Everything the editor reads from disk at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Rows per page of the recent-session list.
    #[serde(default = "default_session_page_size")]
    pub session_page_size: usize,
    /// Track rendering and zoom tunables.
    #[serde(default)]
    pub track: TrackSettings,
    /// Output device preferences.
    #[serde(default)]
    pub audio_output: AudioOutputConfig,
    /// Pointer and wheel behavior.
    #[serde(default)]
    pub controls: InteractionOptions,
    /// Log level and log file retention.
    #[serde(default)]
    pub logging: LoggingOptions,
}

fn default_session_page_size() -> usize {
    20
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            session_page_size: default_session_page_size(),
            track: TrackSettings::default(),
            audio_output: AudioOutputConfig::default(),
            controls: InteractionOptions::default(),
            logging: LoggingOptions::default(),
        }
    }
}

impl EditorConfig {
    /// Clamp every field into its usable range.
    pub fn normalized(self) -> Self {
        Self {
            session_page_size: self.session_page_size.clamp(1, 500),
            track: self.track.normalized(),
            audio_output: self.audio_output,
            controls: self.controls.normalized(),
            logging: self.logging.normalized(),
        }
    }
}

/// Errors that may occur while loading or saving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to create the config directory.
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        /// Directory path that failed to create.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to read the config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to write the config file.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Path that failed to write.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
    /// Failed to serialize config to TOML.
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML serialization error.
        source: toml::ser::Error,
    },
    /// No usable config directory found.
    #[error("No suitable config directory found")]
    NoConfigDir,
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
    }
}
