//! Repository configuration.
//!
//! The configuration names every repository the registry knows about and
//! picks a default one. It is loaded from a YAML file layered over built-in
//! defaults, with `STRATA_` environment variables applied last.
//!
//! ```yaml
//! default_repo: default
//! network:
//!   timeout: 30
//! repos:
//!   default:
//!     type: local
//!     path: ~/.local/share/strata/default
//!   upstream:
//!     type: remote
//!     path: ~/.cache/strata/upstream
//!     url: https://images.example.com/base/
//! ```

use crate::error::{Result, StrataError};
use config::{Config as ConfigRs, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[cfg(test)]
mod tests;

/// Name of the repository used when none is configured.
pub const DEFAULT_REPO_NAME: &str = "default";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Repository used for names without a `repo:` qualifier.
    #[serde(default = "default_repo_name")]
    pub default_repo: String,

    #[serde(default)]
    pub network: Network,

    #[serde(default)]
    pub repos: BTreeMap<String, RepoConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_repo: default_repo_name(),
            network: Network::default(),
            repos: BTreeMap::new(),
        }
    }
}

fn default_repo_name() -> String {
    DEFAULT_REPO_NAME.to_string()
}

impl Config {
    /// Parses a `Config` from a YAML string.
    ///
    /// Environment variables are not consulted.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder()
            // Add default values
            .add_source(defaults()?)
            // Merge with YAML string
            .add_source(File::from_str(s, FileFormat::Yaml));

        Self::from_builder(builder, None)
    }

    /// Loads a `Config` from `path`, then applies `STRATA_*` environment
    /// overrides (nested keys separated by `__`, e.g.
    /// `STRATA_NETWORK__TIMEOUT=60`).
    pub fn load(path: &Path) -> Result<Self> {
        let builder = ConfigRs::builder()
            .add_source(defaults()?)
            .add_source(File::from(path).format(FileFormat::Yaml).required(true))
            .add_source(Environment::with_prefix("STRATA").separator("__"));

        Self::from_builder(builder, Some(path))
    }

    /// A configuration with a single local repository named
    /// [`DEFAULT_REPO_NAME`] stored at `path`.
    pub fn with_local_default(path: impl Into<String>) -> Self {
        let mut config = Self::default();
        config
            .repos
            .insert(default_repo_name(), RepoConfig::local(path));
        config
    }

    /// Creates a `Config` from a `config::ConfigBuilder`.
    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        path: Option<&Path>,
    ) -> Result<Self> {
        let path = path.map(|p| p.display().to_string());
        let config: Config = builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                StrataError::config_with_source(
                    "Failed to deserialize configuration".to_string(),
                    path.clone(),
                    e,
                )
            })?;
        config.validate().map_err(|e| match e {
            StrataError::Config {
                message, source, ..
            } => StrataError::Config {
                message,
                path,
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Checks that every repository is usable and that the default
    /// repository exists whenever any repository is configured.
    pub fn validate(&self) -> Result<()> {
        for (name, repo) in &self.repos {
            if repo.path.trim().is_empty() {
                return Err(StrataError::config(
                    format!("Repository '{}' has no path", name),
                    None,
                ));
            }
            if repo.kind == RepoKind::Remote && repo.url.is_none() {
                return Err(StrataError::config(
                    format!("Remote repository '{}' has no url", name),
                    None,
                ));
            }
        }

        if !self.repos.is_empty() && !self.repos.contains_key(&self.default_repo) {
            return Err(StrataError::config(
                format!("Default repository '{}' is not configured", self.default_repo),
                None,
            ));
        }

        Ok(())
    }
}

fn defaults() -> Result<ConfigRs> {
    ConfigRs::try_from(&Config::default()).map_err(|e| {
        StrataError::config_with_source("Failed to build default configuration", None, e)
    })
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    /// Timeout for remote index requests, in seconds.
    #[serde(default = "default_network_timeout")]
    pub timeout: u64,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            timeout: default_network_timeout(),
        }
    }
}

fn default_network_timeout() -> u64 {
    30
}

/// Whether a repository is authoritative locally or mirrors a remote one.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RepoKind {
    #[default]
    Local,

    /// The local index is a cache of the index served at the repository URL.
    Remote,
}

/// Configuration for a single repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoConfig {
    #[serde(rename = "type", default)]
    pub kind: RepoKind,

    /// Storage directory; a leading `~` expands to the home directory.
    pub path: String,

    #[serde(default)]
    pub url: Option<String>,
}

impl RepoConfig {
    /// A local repository stored at `path`.
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            kind: RepoKind::Local,
            path: path.into(),
            url: None,
        }
    }

    /// A local cache at `path` of the remote repository at `url`.
    pub fn remote(path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: RepoKind::Remote,
            path: path.into(),
            url: Some(url.into()),
        }
    }

    /// The storage directory with `~` expanded.
    pub fn storage_path(&self) -> PathBuf {
        expand_path(&self.path)
    }
}

/// Expands a leading `~` to the user's home directory.
///
/// # Examples
///
/// ```
/// use libstrata::config::expand_path;
/// use std::path::PathBuf;
///
/// assert_eq!(expand_path("/srv/images"), PathBuf::from("/srv/images"));
/// ```
pub fn expand_path(path: &str) -> PathBuf {
    let home = match dirs::home_dir() {
        Some(home) => home,
        None => return PathBuf::from(path),
    };

    if path == "~" {
        home
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}
