//! Effective import settings
//!
//! A few settings may be overridden per deployment without editing the TOML
//! file. Priority: ENV → TOML → built-in default. The winning source is
//! logged at startup.

use casemap_common::config::{GeocodingConfig, ImportConfig, TomlConfig};
use tracing::{info, warn};

pub const GEOCODER_URL_ENV_VAR: &str = "CASEMAP_GEOCODER_URL";
pub const GEOCODER_USER_AGENT_ENV_VAR: &str = "CASEMAP_GEOCODER_USER_AGENT";
pub const INITIAL_STATE_ENV_VAR: &str = "CASEMAP_INITIAL_STATE";

/// Settings the import service runs with
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSettings {
    pub geocoding: GeocodingConfig,
    pub import: ImportConfig,
}

/// Apply environment overrides on top of the loaded TOML config
pub fn resolve_settings(toml_config: &TomlConfig) -> ImportSettings {
    let geocoding_defaults = GeocodingConfig::default();
    let import_defaults = ImportConfig::default();

    let mut geocoding = toml_config.geocoding.clone();
    let mut import = toml_config.import.clone();

    geocoding.base_url = resolve_value(
        "Geocoder URL",
        GEOCODER_URL_ENV_VAR,
        &toml_config.geocoding.base_url,
        &geocoding_defaults.base_url,
    );
    geocoding.user_agent = resolve_value(
        "Geocoder User-Agent",
        GEOCODER_USER_AGENT_ENV_VAR,
        &toml_config.geocoding.user_agent,
        &geocoding_defaults.user_agent,
    );
    import.initial_state_name = resolve_value(
        "Initial workflow state",
        INITIAL_STATE_ENV_VAR,
        &toml_config.import.initial_state_name,
        &import_defaults.initial_state_name,
    );

    if !geocoding.enabled {
        warn!("Online geocoding disabled; only explicit coordinates will resolve");
    }

    ImportSettings { geocoding, import }
}

/// Non-empty, non-whitespace
pub fn is_set(value: &str) -> bool {
    !value.trim().is_empty()
}

fn resolve_value(label: &str, env_var: &str, toml_value: &str, default: &str) -> String {
    if let Ok(value) = std::env::var(env_var) {
        if is_set(&value) {
            info!("{} loaded from environment variable {}", label, env_var);
            return value.trim().to_string();
        }
    }

    if is_set(toml_value) && toml_value != default {
        info!("{} loaded from TOML config", label);
        return toml_value.trim().to_string();
    }

    info!("{} using built-in default", label);
    default.to_string()
}
