use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app_dirs::{self, AppDirError};

use super::types::{ConfigError, StudymlConfig};

/// Default filename used to store the configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolve the configuration file path under the app root.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load `<app root>/config.toml`, returning defaults if it does not exist.
pub fn load_or_default() -> Result<StudymlConfig, ConfigError> {
    let path = config_path()?;
    if !path.exists() {
        tracing::debug!("No config at {}; using defaults", path.display());
        return Ok(StudymlConfig::default());
    }
    load_from(&path)
}

/// Load and validate a configuration file. Missing keys take their defaults.
pub fn load_from(path: &Path) -> Result<StudymlConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: StudymlConfig = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Save configuration to a specific path, creating parent directories as needed.
pub fn save_to_path(config: &StudymlConfig, path: &Path) -> Result<(), ConfigError> {
    let data = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    atomic_write(path, data.as_bytes())
}

/// Write through a temporary sibling file renamed over `path`.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::CreateDir {
        path: dir.clone(),
        source,
    })?;
    let write_error = |source: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(write_error)?;
    file.write_all(data).map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(path).map_err(|err| write_error(err.error))?;
    Ok(())
}

fn map_app_dir_error(error: AppDirError) -> ConfigError {
    match error {
        AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        AppDirError::CreateDir { path, source } => ConfigError::CreateDir { path, source },
    }
}
