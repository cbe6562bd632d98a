use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::app_dirs;

use super::save::save_to_path;
use super::{CONFIG_FILE_NAME, ConfigError, EditorConfig, map_app_dir_error};

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from the app root.
///
/// On first run the defaults are written out so there is a file to edit.
pub fn load_or_default() -> Result<EditorConfig, ConfigError> {
    let path = config_path()?;
    if !path.exists() {
        let config = EditorConfig::default();
        match save_to_path(&config, &path) {
            Ok(()) => info!("Wrote default config to {}", path.display()),
            Err(err) => warn!("Could not write default config: {err}"),
        }
        return Ok(config);
    }
    let config = load_from(&path)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Load and normalize the configuration stored at `path`.
pub fn load_from(path: &Path) -> Result<EditorConfig, ConfigError> {
    if !path.exists() {
        debug!("No config at {}; using defaults", path.display());
        return Ok(EditorConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<EditorConfig>(&text)
        .map(EditorConfig::normalized)
        .map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
}
