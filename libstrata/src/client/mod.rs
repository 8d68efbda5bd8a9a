//! HTTP client for remote repositories.
//!
//! A remote repository is a directory served over HTTP(S) that contains an
//! `index.yaml` in the same format as a local repository. This client resolves
//! resources relative to the repository URL and downloads them. It is a thin
//! blocking wrapper over reqwest.

use crate::error::{Result, StrataError};
use crate::index::Index;
use crate::index::store::INDEX_FILE;
use reqwest::StatusCode;
use reqwest::blocking::{Client as ReqwestClient, Response};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[cfg(test)]
mod tests;

/// Configuration for the HTTP client.
///
/// # Examples
///
/// ```
/// use libstrata::client::ClientConfig;
///
/// let config = ClientConfig::new().with_timeout(60);
/// assert_eq!(config.timeout_seconds, 60);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

impl ClientConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// HTTP client bound to one remote repository URL.
#[derive(Debug, Clone)]
pub struct Client {
    /// The underlying HTTP client
    http_client: ReqwestClient,
    /// Repository URL, always ending in `/`
    base_url: Url,
}

impl Client {
    /// Creates a new client for the repository at `base_url` with default
    /// configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use libstrata::client::Client;
    ///
    /// let client = Client::new("images.example.com/base").unwrap();
    /// assert_eq!(client.base_url().as_str(), "http://images.example.com/base/");
    /// ```
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, ClientConfig::default())
    }

    /// Creates a new client with custom configuration.
    pub fn with_config(base_url: &str, config: ClientConfig) -> Result<Self> {
        let base_url = Self::normalize_url(base_url)?;

        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                StrataError::remote_fetch_with_source(
                    base_url.as_str(),
                    "Failed to create HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Adds a default scheme if missing and makes the URL a directory so that
    /// relative resources resolve beneath it.
    fn normalize_url(url: &str) -> Result<Url> {
        let url = url.trim();

        if url.is_empty() {
            return Err(StrataError::validation("Repository URL cannot be empty"));
        }

        let url = if !url.starts_with("http://") && !url.starts_with("https://") {
            format!("http://{}", url)
        } else {
            url.to_string()
        };

        let mut parsed = Url::parse(&url).map_err(|e| {
            StrataError::validation_with_source(format!("Invalid repository URL: {}", url), e)
        })?;

        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        Ok(parsed)
    }

    /// Returns the repository URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `name` relative to the repository URL.
    pub fn resource_url(&self, name: &str) -> Result<Url> {
        self.base_url.join(name).map_err(|e| {
            StrataError::validation_with_source(format!("Invalid resource name: {}", name), e)
        })
    }

    /// Downloads the resource `name` beneath the repository URL.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::RemoteFetchFailed`] if the server is unreachable,
    /// answers with a non-success status, or the body cannot be read.
    pub fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        let url = self.resource_url(name)?;
        debug!(url = %url, "Fetching remote resource");

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .map_err(|e| Self::translate_reqwest_error(e, url.as_str()))?;

        let response = Self::check_response_status(response)?;

        let body = response.bytes().map_err(|e| {
            StrataError::remote_fetch_with_source(url.as_str(), "Failed to read response body", e)
        })?;

        Ok(body.to_vec())
    }

    /// Downloads and parses the repository's index.
    ///
    /// # Errors
    ///
    /// - [`StrataError::RemoteFetchFailed`] for transport failures and
    ///   documents that do not parse
    /// - [`StrataError::IndexVersionMismatch`] if the remote index uses a
    ///   schema version this library does not read
    pub fn fetch_index(&self) -> Result<Index> {
        let bytes = self.fetch(INDEX_FILE)?;
        let url = self.resource_url(INDEX_FILE)?;

        let text = std::str::from_utf8(&bytes).map_err(|e| {
            StrataError::remote_fetch_with_source(url.as_str(), "Index is not valid UTF-8", e)
        })?;

        Index::from_yaml(text).map_err(|e| match e {
            StrataError::IndexVersionMismatch {
                found, supported, ..
            } => StrataError::index_version_mismatch(found, supported, Some(url.to_string())),
            other => StrataError::remote_fetch_with_source(
                url.as_str(),
                "Failed to parse remote index",
                other,
            ),
        })
    }

    /// Translates reqwest errors into RemoteFetchFailed with a useful message.
    fn translate_reqwest_error(error: reqwest::Error, url: &str) -> StrataError {
        let message = if error.is_timeout() {
            "Request timed out"
        } else if error.is_connect() {
            "Failed to connect"
        } else if error.is_request() {
            "Failed to send request"
        } else {
            "Network error"
        };
        StrataError::remote_fetch_with_source(url, message, error)
    }

    /// Turns non-success statuses into RemoteFetchFailed.
    fn check_response_status(response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().to_string();
        let error_body = response
            .text()
            .unwrap_or_else(|_| String::from("(unable to read response body)"));

        let message = match status {
            StatusCode::NOT_FOUND => "Remote index not found (404)".to_string(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                format!("Access denied ({}): {}", status.as_u16(), error_body)
            }
            s if s.is_server_error() => {
                format!("Server error ({}): {}", status.as_u16(), error_body)
            }
            _ => format!("HTTP {}: {}", status.as_u16(), error_body),
        };

        Err(StrataError::remote_fetch(url, message))
    }
}
