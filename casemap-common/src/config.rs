//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CASEMAP_CONFIG";

/// Environment variable naming the root folder (database location)
pub const ROOT_FOLDER_ENV_VAR: &str = "CASEMAP_ROOT_FOLDER";

/// Config file name looked up under the platform config directory
pub const CONFIG_FILE_NAME: &str = "casemap.toml";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "casemap.db";

/// Contents of `casemap.toml`
///
/// Every section is optional; missing keys fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the database
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub geocoding: GeocodingConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (overridden by `RUST_LOG`)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5780".to_string(),
        }
    }
}

/// Online geocoding settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// When false only explicit coordinates are used
    pub enabled: bool,
    /// Base URL of a Nominatim-compatible search service
    pub base_url: String,
    /// User-Agent sent with every request (required upstream)
    pub user_agent: String,
    /// Minimum spacing between two outbound requests, process-wide
    pub min_interval_ms: u64,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// City assumed when a row names none
    pub default_city: String,
    /// Region (department/state) appended to region-bearing queries
    pub region: String,
    pub country: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("casemap-import/", env!("CARGO_PKG_VERSION"), " (case report geocoding)")
                .to_string(),
            min_interval_ms: 1100,
            timeout_secs: 10,
            default_city: "Armenia".to_string(),
            region: "Quindío".to_string(),
            country: "Colombia".to_string(),
        }
    }
}

/// Import behaviour settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Name of the workflow state assigned to every imported case
    pub initial_state_name: String,
    /// Reference catalog category used to resolve classification text
    pub classification_category: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            initial_state_name: "Reportado".to_string(),
            classification_category: "dengue_classification".to_string(),
        }
    }
}

/// Locate the config file
///
/// Priority order:
/// 1. Command-line argument
/// 2. `CASEMAP_CONFIG` environment variable
/// 3. `<platform config dir>/casemap/casemap.toml`, if it exists
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("casemap").join(CONFIG_FILE_NAME))
        .filter(|p| p.exists())
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load configuration with graceful degradation
///
/// A missing file yields defaults with a warning; a file that exists but
/// does not parse is an error.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            info!("Configuration loaded from {}", path.display());
            Ok(config)
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            info!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Resolve the root folder
///
/// Priority order:
/// 1. Command-line argument
/// 2. `CASEMAP_ROOT_FOLDER` environment variable
/// 3. `root_folder` from the TOML config
/// 4. OS-dependent default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder (`~/.local/share/casemap` on Linux)
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("casemap"))
        .unwrap_or_else(|| PathBuf::from("./casemap_data"))
}

/// Database file inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE_NAME)
}

/// Write config atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    Ok(())
}
