//! Strata - content-addressed layered disk-image repositories
//!
//! Strata stores virtual-machine disk images by content hash. An image may be
//! stored as a delta against a parent image, and images can be tagged with
//! human-readable names. Each repository keeps its state in a versioned
//! `index.yaml`; a registry groups several named repositories, some of which
//! may mirror a remote repository served over HTTP.
//!
//! # Quick Start
//!
//! ```no_run
//! use libstrata::{Config, ImageMetadata, QemuImg, Registry};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = Registry::new(Config::with_local_default("/srv/images"))?;
//!     let repo = registry.repo(None)?;
//!
//!     // Import a base image and tag it
//!     let id = repo.add_image(
//!         &QemuImg::new(),
//!         Path::new("debian-12.qcow2"),
//!         ImageMetadata::described("Debian 12 base"),
//!     )?;
//!     repo.add_tag("debian", &id)?;
//!
//!     // Import a layer on top of it
//!     repo.add_image(
//!         &QemuImg::new(),
//!         Path::new("debian-12-nginx.qcow2"),
//!         ImageMetadata::described("with nginx").with_parent("debian"),
//!     )?;
//!
//!     for listing in registry.list_all_artifacts()? {
//!         println!("{} {:?}", listing.name, listing.parent);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Main Types
//!
//! - [`Registry`] - Entry point; all configured repositories by name
//! - [`Repository`] - One repository: lookup, import, tagging, remote fetch
//! - [`Index`] - The persisted state of a repository
//! - [`ImageBackend`] - Image conversion contract, implemented by [`QemuImg`]
//! - [`Config`] - Repository configuration

#![warn(clippy::all)]

/// Returns the libstrata crate version.
///
/// # Examples
///
/// ```
/// let version = libstrata::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// Re-export commonly used types for convenience
pub use backend::{ImageBackend, ImageInfo, QemuImg};
pub use config::{Config, RepoConfig, RepoKind};
pub use error::{Result, StrataError};
pub use index::{Artifact, ImageMetadata, Index};
pub use registry::{ArtifactListing, Registry};
pub use repository::Repository;

pub mod backend;
pub mod client;
pub mod config;
pub mod digest;
pub mod error;
pub mod format;
pub mod index;
pub mod registry;
pub mod repository;
