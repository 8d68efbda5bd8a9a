//! Image conversion backend contract.
//!
//! The repository never reads image formats itself. Hashing stored content,
//! copying images into storage, inspecting them and rewriting their delta base
//! are delegated to an [`ImageBackend`]. [`QemuImg`] implements the contract on
//! top of the `qemu-img` tool.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod qemu;

pub use qemu::QemuImg;


/// Metadata reported by a backend for a stored image.
///
/// Only these fields are copied into the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImageInfo {
    pub virtual_size: u64,
    #[serde(default)]
    pub actual_size: u64,
    pub format: String,
    #[serde(default)]
    pub format_specific: Option<serde_json::Value>,
}

/// Operations the repository needs from an image conversion tool.
pub trait ImageBackend {
    /// Computes a stable content hash of the image at `source`.
    ///
    /// This may scan the full image and dominate ingestion time.
    fn content_hash(&self, source: &Path) -> Result<String>;

    /// Stores a copy of `source` at `dest`, as a delta against `parent` when
    /// one is given.
    fn copy(&self, source: &Path, dest: &Path, parent: Option<&Path>) -> Result<()>;

    /// Reports format metadata for the image at `path`.
    fn inspect(&self, path: &Path) -> Result<ImageInfo>;

    /// Points the delta base of the image at `path` to `parent` without
    /// changing its guest-visible content.
    fn rebase(&self, path: &Path, parent: &Path) -> Result<()>;
}
