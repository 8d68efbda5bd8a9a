//! Error types for Strata
//!
//! Every repository and registry operation reports failures through
//! [`StrataError`]. Each failure mode has its own variant so callers can react
//! differently, e.g. retry on [`StrataError::RemoteFetchFailed`] but abort on
//! [`StrataError::ParentNotFound`].

use thiserror::Error;

#[cfg(test)]
mod tests;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for Strata operations
#[derive(Error, Debug)]
pub enum StrataError {
    /// The parent named for an ingestion does not resolve in the repository
    #[error("Parent image not found: {parent}")]
    ParentNotFound { parent: String },

    /// A tag was pointed at a name that does not resolve
    #[error("Cannot tag '{tag}': image not found: {target}")]
    TagTargetNotFound { tag: String, target: String },

    /// An ancestry walk hit a parent reference that does not resolve
    #[error("Broken ancestry chain: image {image} references missing parent {parent}")]
    BrokenAncestryChain { image: String, parent: String },

    /// A hash prefix matches more than one image
    #[error("Ambiguous reference '{name}' matches {} images: {}", .candidates.len(), .candidates.join(", "))]
    AmbiguousReference {
        name: String,
        candidates: Vec<String>,
    },

    /// A persisted or fetched index declares a schema version we do not read
    #[error("Unsupported index version {found} (supported: {supported})")]
    IndexVersionMismatch {
        found: u32,
        supported: u32,
        path: Option<String>,
    },

    /// Network, HTTP or parse failure while refreshing a remote index
    #[error("Failed to fetch remote index from {url}: {message}")]
    RemoteFetchFailed {
        url: String,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Filesystem failure on an index, lock or image file
    #[error("Storage error: {message}")]
    StorageIo {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// A name or repository does not resolve
    #[error("{resource_type} not found: {name}")]
    NotFound { resource_type: String, name: String },

    /// Malformed index documents and invalid input
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Configuration errors (invalid config file, missing settings)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The image conversion backend failed
    #[error("Backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

/// Result type alias for Strata operations
pub type Result<T> = std::result::Result<T, StrataError>;

impl StrataError {
    /// Creates a new parent-not-found error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libstrata::error::StrataError;
    ///
    /// let err = StrataError::parent_not_found("aaa111");
    /// assert!(matches!(err, StrataError::ParentNotFound { .. }));
    /// ```
    pub fn parent_not_found<S: Into<String>>(parent: S) -> Self {
        Self::ParentNotFound {
            parent: parent.into(),
        }
    }

    /// Creates a new tag-target-not-found error.
    pub fn tag_target_not_found<S: Into<String>>(tag: S, target: S) -> Self {
        Self::TagTargetNotFound {
            tag: tag.into(),
            target: target.into(),
        }
    }

    /// Creates a new broken-ancestry-chain error.
    pub fn broken_ancestry_chain<S: Into<String>>(image: S, parent: S) -> Self {
        Self::BrokenAncestryChain {
            image: image.into(),
            parent: parent.into(),
        }
    }

    /// Creates a new ambiguous-reference error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libstrata::error::StrataError;
    ///
    /// let err = StrataError::ambiguous_reference("abc", vec!["abc123".into(), "abc456".into()]);
    /// assert!(err.to_string().contains("abc123, abc456"));
    /// ```
    pub fn ambiguous_reference<S: Into<String>>(name: S, candidates: Vec<String>) -> Self {
        Self::AmbiguousReference {
            name: name.into(),
            candidates,
        }
    }

    /// Creates a new index version mismatch error.
    pub fn index_version_mismatch(found: u32, supported: u32, path: Option<String>) -> Self {
        Self::IndexVersionMismatch {
            found,
            supported,
            path,
        }
    }

    /// Creates a new remote fetch error.
    pub fn remote_fetch<S: Into<String>>(url: S, message: S) -> Self {
        Self::RemoteFetchFailed {
            url: url.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new remote fetch error with a source error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libstrata::error::StrataError;
    /// use std::io;
    ///
    /// let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
    /// let err = StrataError::remote_fetch_with_source("http://localhost:8080/", "connect failed", io_err);
    /// assert!(matches!(err, StrataError::RemoteFetchFailed { .. }));
    /// ```
    pub fn remote_fetch_with_source<S, E>(url: S, message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::RemoteFetchFailed {
            url: url.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new storage error wrapping an I/O failure on `path`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libstrata::error::StrataError;
    /// use std::io;
    ///
    /// let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
    /// let err = StrataError::storage_io("Failed to write index", "/srv/images/index.yaml", io_err);
    /// assert!(matches!(err, StrataError::StorageIo { .. }));
    /// ```
    pub fn storage_io<S, P>(message: S, path: P, source: std::io::Error) -> Self
    where
        S: Into<String>,
        P: AsRef<std::path::Path>,
    {
        Self::StorageIo {
            message: message.into(),
            path: Some(path.as_ref().display().to_string()),
            source: Some(source),
        }
    }

    /// Creates a new not found error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libstrata::error::StrataError;
    ///
    /// let err = StrataError::not_found("image", "centos7");
    /// assert!(matches!(err, StrataError::NotFound { .. }));
    /// ```
    pub fn not_found<S: Into<String>>(resource_type: S, name: S) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new validation error with a source error.
    pub fn validation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libstrata::error::StrataError;
    ///
    /// let err = StrataError::config("remote repository needs a url", Some("/etc/strata.yaml"));
    /// assert!(matches!(err, StrataError::Config { .. }));
    /// ```
    pub fn config<S: Into<String>>(message: S, path: Option<S>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: None,
        }
    }

    /// Creates a new configuration error with a source error.
    pub fn config_with_source<S, E>(message: S, path: Option<S>, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new backend error.
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new backend error with a source error.
    pub fn backend_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true when retrying the same call may succeed.
    ///
    /// Only remote fetches are transient; everything else reflects the state
    /// of the repository or the caller's input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteFetchFailed { .. })
    }
}
