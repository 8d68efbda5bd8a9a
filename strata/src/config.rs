//! Locating and initializing the configuration file.

use libstrata::Config;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config file path, respecting the STRATA_CONFIG environment variable
pub fn get_config_path() -> PathBuf {
    if let Ok(config_path) = env::var("STRATA_CONFIG") {
        return PathBuf::from(config_path);
    }

    // Default to ~/.config/strata/config.yaml
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("strata").join("config.yaml")
    } else {
        PathBuf::from("config.yaml")
    }
}

/// Storage directory of the implicit `default` repository
pub fn get_default_repo_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("strata").join("default")
    } else {
        PathBuf::from("strata").join("default")
    }
}

/// Configuration used when no config file exists
pub fn fallback_config() -> Config {
    Config::with_local_default(get_default_repo_path().display().to_string())
}

/// Load the config file at `path`, or the fallback when it does not exist
pub fn load_config(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        return Ok(fallback_config());
    }
    Config::load(path).map_err(|e| e.to_string())
}

/// Write the fallback configuration to `path`
pub fn init_config(path: &Path) -> Result<Config, String> {
    if path.exists() {
        return Err(format!(
            "Config file already exists at {}. Edit it directly or remove it to recreate.",
            path.display()
        ));
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    let config = fallback_config();
    let yaml = serde_yaml::to_string(&config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, yaml).map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
