//! `qemu-img` backed implementation of [`ImageBackend`].

use super::{ImageBackend, ImageInfo};
use crate::digest::sha256_file;
use crate::error::{Result, StrataError};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::debug;

/// Storage format used for every stored image.
const STORAGE_FORMAT: &str = "qcow2";

/// Drives the `qemu-img` command line tool.
#[derive(Debug, Clone)]
pub struct QemuImg {
    binary: PathBuf,
}

impl Default for QemuImg {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("qemu-img"),
        }
    }
}

impl QemuImg {
    /// Uses `qemu-img` from `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the `qemu-img` binary at `binary`.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Runs `qemu-img` with `args` and returns its stdout.
    fn run(&self, args: &[&OsStr]) -> Result<Vec<u8>> {
        debug!(binary = %self.binary.display(), ?args, "Running qemu-img");
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|e| {
                StrataError::backend_with_source(
                    format!("Failed to run {}", self.binary.display()),
                    e,
                )
            })?;

        if !output.status.success() {
            let subcommand = args
                .first()
                .map(|arg| arg.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Err(StrataError::backend(format!(
                "qemu-img {} failed ({}): {}",
                subcommand,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(output.stdout)
    }
}

impl ImageBackend for QemuImg {
    /// Hashes the guest-visible content: the image is expanded to raw in a
    /// temporary file and that stream is hashed, so two images with the same
    /// disk content but different allocation hash the same.
    fn content_hash(&self, source: &Path) -> Result<String> {
        let raw = NamedTempFile::new()
            .map_err(|e| StrataError::backend_with_source("Failed to create scratch file", e))?;
        self.run(&[
            OsStr::new("convert"),
            OsStr::new("-O"),
            OsStr::new("raw"),
            source.as_os_str(),
            raw.path().as_os_str(),
        ])?;
        sha256_file(raw.path())
    }

    fn copy(&self, source: &Path, dest: &Path, parent: Option<&Path>) -> Result<()> {
        let mut args: Vec<&OsStr> = vec![
            OsStr::new("convert"),
            OsStr::new("-O"),
            OsStr::new(STORAGE_FORMAT),
        ];
        if let Some(parent) = parent {
            args.extend([
                OsStr::new("-B"),
                parent.as_os_str(),
                OsStr::new("-F"),
                OsStr::new(STORAGE_FORMAT),
            ]);
        }
        args.extend([source.as_os_str(), dest.as_os_str()]);
        self.run(&args)?;
        Ok(())
    }

    fn inspect(&self, path: &Path) -> Result<ImageInfo> {
        let stdout = self.run(&[
            OsStr::new("info"),
            OsStr::new("--output=json"),
            path.as_os_str(),
        ])?;
        serde_json::from_slice(&stdout).map_err(|e| {
            StrataError::backend_with_source(
                format!("Failed to parse qemu-img info for {}", path.display()),
                e,
            )
        })
    }

    fn rebase(&self, path: &Path, parent: &Path) -> Result<()> {
        let backing = backing_reference(path, parent);
        self.run(&[
            OsStr::new("rebase"),
            OsStr::new("-u"),
            OsStr::new("-F"),
            OsStr::new(STORAGE_FORMAT),
            OsStr::new("-b"),
            backing.as_os_str(),
            path.as_os_str(),
        ])?;
        Ok(())
    }
}

/// Backing file reference recorded in `path`.
///
/// Siblings are referenced by bare file name so that a repository directory
/// can be moved or served as a whole.
pub(super) fn backing_reference(path: &Path, parent: &Path) -> OsString {
    match (path.parent(), parent.parent(), parent.file_name()) {
        (Some(dir), Some(parent_dir), Some(name)) if dir == parent_dir => name.to_os_string(),
        _ => parent.as_os_str().to_os_string(),
    }
}
