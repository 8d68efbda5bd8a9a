//! Multi-repository registry.
//!
//! The [`Registry`] is the main entry point of the library. It holds the
//! configuration, opens repositories on first use and understands qualified
//! names of the form `repo:name`, where `name` is anything a single
//! repository resolves (full id, unique id prefix, or tag). An unqualified
//! name refers to the default repository.
//!
//! # Examples
//!
//! ```no_run
//! use libstrata::{Config, Registry};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::with_local_default("/srv/images");
//!     let mut registry = Registry::new(config)?;
//!
//!     for listing in registry.list_all_artifacts()? {
//!         println!("{} {}", listing.name, listing.description.unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

use crate::client::ClientConfig;
use crate::config::Config;
use crate::error::{Result, StrataError};
use crate::repository::Repository;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::{debug, warn};


/// One row of the registry-wide image listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactListing {
    /// Repository holding the image.
    pub repo: String,
    /// Full content hash.
    pub id: String,
    /// Qualified short name, e.g. `default:stable`.
    pub name: String,
    /// Stored size in bytes.
    pub size: Option<u64>,
    /// Qualified short name of the parent image.
    pub parent: Option<String>,
    pub description: Option<String>,
}

/// All configured repositories, addressable by name.
#[derive(Debug)]
pub struct Registry {
    config: Config,
    /// Repositories opened so far.
    repos: BTreeMap<String, Repository>,
}

impl Registry {
    /// Creates a registry for `config`. Repositories are opened lazily.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            repos: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Name of the repository used for unqualified names.
    pub fn default_repo(&self) -> &str {
        &self.config.default_repo
    }

    /// Configured repository names, sorted.
    pub fn repo_names(&self) -> Vec<&str> {
        self.config.repos.keys().map(String::as_str).collect()
    }

    /// Returns the named repository, or the default one for `None`, opening
    /// it on first access.
    ///
    /// # Errors
    ///
    /// [`StrataError::NotFound`] if no repository of that name is configured.
    pub fn repo(&mut self, name: Option<&str>) -> Result<&mut Repository> {
        let name = name.unwrap_or(&self.config.default_repo).to_string();

        match self.repos.entry(name) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let repo_config = self
                    .config
                    .repos
                    .get(entry.key())
                    .ok_or_else(|| StrataError::not_found("repository", entry.key().as_str()))?;
                let client_config = ClientConfig::new().with_timeout(self.config.network.timeout);
                let repo = Repository::open_with_client(repo_config, client_config)?;
                debug!(
                    repo = %entry.key(),
                    path = %repo.path().display(),
                    images = repo.images().len(),
                    "Opened repository"
                );
                Ok(entry.insert(repo))
            }
        }
    }

    /// Splits a qualified name on its first `:` into repository and local
    /// name.
    ///
    /// # Examples
    ///
    /// ```
    /// use libstrata::Registry;
    ///
    /// assert_eq!(Registry::parse_name("base:stable"), (Some("base"), "stable"));
    /// assert_eq!(Registry::parse_name("stable"), (None, "stable"));
    /// ```
    pub fn parse_name(qualified: &str) -> (Option<&str>, &str) {
        match qualified.split_once(':') {
            Some((repo, name)) => (Some(repo), name),
            None => (None, qualified),
        }
    }

    /// Resolves a qualified name to its repository name and full id.
    pub fn resolve(&mut self, qualified: &str) -> Result<(String, String)> {
        let (repo_name, local) = Self::parse_name(qualified);
        let repo_name = repo_name
            .unwrap_or(&self.config.default_repo)
            .to_string();
        let id = self.repo(Some(repo_name.as_str()))?.find(local)?;
        Ok((repo_name, id))
    }

    /// Display form of a qualified name: `repo:short`, where `short` is the
    /// repository's tag or shortest unique prefix for the resolved id.
    ///
    /// Unqualified names are looked up in `default_repo`. `None` maps to
    /// `None`.
    pub fn short_name(
        &mut self,
        qualified: Option<&str>,
        default_repo: &str,
    ) -> Result<Option<String>> {
        let Some(qualified) = qualified else {
            return Ok(None);
        };

        let (repo_name, local) = Self::parse_name(qualified);
        let repo_name = repo_name.unwrap_or(default_repo);
        let repo = self.repo(Some(repo_name))?;
        display_name(repo_name, repo, local).map(Some)
    }

    /// Lists every image of every configured repository, in repository then
    /// id order.
    ///
    /// A parent that no longer resolves is listed by its raw id.
    pub fn list_all_artifacts(&mut self) -> Result<Vec<ArtifactListing>> {
        let repo_names: Vec<String> = self.config.repos.keys().cloned().collect();
        let mut listings = Vec::new();

        for repo_name in repo_names {
            let repo: &Repository = self.repo(Some(repo_name.as_str()))?;
            for artifact in repo.images().values() {
                let parent = artifact.parent.as_deref().map(|parent| {
                    display_name(&repo_name, repo, parent).unwrap_or_else(|e| {
                        warn!(
                            repo = %repo_name,
                            id = %artifact.id,
                            parent = %parent,
                            error = %e,
                            "Parent does not resolve"
                        );
                        format!("{}:{}", repo_name, parent)
                    })
                });

                listings.push(ArtifactListing {
                    repo: repo_name.clone(),
                    id: artifact.id.clone(),
                    name: format!("{}:{}", repo_name, repo.short_name(&artifact.id)),
                    size: artifact.actual_size,
                    parent,
                    description: artifact.description.clone(),
                });
            }
        }

        Ok(listings)
    }
}

fn display_name(repo_name: &str, repo: &Repository, local: &str) -> Result<String> {
    let id = repo.find(local)?;
    Ok(format!("{}:{}", repo_name, repo.short_name(&id)))
}
