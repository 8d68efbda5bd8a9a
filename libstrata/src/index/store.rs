//! On-disk persistence for repository indexes.
//!
//! The index lives at `<repo>/index.yaml`. Writes go to a temporary file in
//! the same directory which is synced and then renamed over the index, so a
//! crash never leaves a truncated document behind. Writers serialize through an
//! advisory lock on `<repo>/index.lock`.
//!
//! Every read and write returns a fingerprint (SHA-256 of the file bytes).
//! Callers keep the fingerprint of the state they hold in memory and compare it
//! under the lock to detect a concurrent writer.

use super::Index;
use crate::digest::sha256_bytes;
use crate::error::{Result, StrataError};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions, Permissions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use tracing::debug;

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

/// File name of the index inside a repository directory.
pub const INDEX_FILE: &str = "index.yaml";

/// File name of the advisory writer lock inside a repository directory.
pub const LOCK_FILE: &str = "index.lock";

/// Returns the index path for a repository directory.
pub fn index_path(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE)
}

/// Reads the raw index bytes, or `None` if the index file does not exist.
pub fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StrataError::storage_io("Failed to read index", path, e)),
    }
}

/// Parses raw index bytes.
pub fn parse_bytes(bytes: &[u8], path: &Path) -> Result<Index> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| StrataError::validation_with_source("Index is not valid UTF-8", e))?;
    Index::from_yaml(text).map_err(|e| match e {
        StrataError::IndexVersionMismatch {
            found, supported, ..
        } => StrataError::index_version_mismatch(
            found,
            supported,
            Some(path.display().to_string()),
        ),
        other => other,
    })
}

/// Loads the index at `path` together with its fingerprint.
///
/// A missing file yields an empty index and no fingerprint.
pub fn load(path: &Path) -> Result<(Index, Option<String>)> {
    match read_bytes(path)? {
        Some(bytes) => {
            let index = parse_bytes(&bytes, path)?;
            debug!(path = %path.display(), images = index.images.len(), tags = index.tags.len(), "Loaded index");
            Ok((index, Some(sha256_bytes(&bytes))))
        }
        None => {
            debug!(path = %path.display(), "No index on disk, starting empty");
            Ok((Index::default(), None))
        }
    }
}

/// Fingerprint of the index currently on disk, `None` if there is none.
pub fn fingerprint(path: &Path) -> Result<Option<String>> {
    Ok(read_bytes(path)?.map(|bytes| sha256_bytes(&bytes)))
}

/// Atomically replaces the index at `path` and returns the new fingerprint.
pub fn save(path: &Path, index: &Index) -> Result<String> {
    let document = index.to_yaml()?;
    write_atomic(path, document.as_bytes())?;
    debug!(path = %path.display(), images = index.images.len(), tags = index.tags.len(), "Persisted index");
    Ok(sha256_bytes(document.as_bytes()))
}

/// Writes `bytes` to a sibling temporary file, syncs it and renames it over
/// `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| StrataError::validation(format!("Invalid index path: {}", path.display())))?;
    fs::create_dir_all(dir)
        .map_err(|e| StrataError::storage_io("Failed to create repository directory", dir, e))?;

    let existing = fs::metadata(path).ok().map(|meta| meta.permissions());
    let mut temp = temp_file_in(dir, existing)
        .map_err(|e| StrataError::storage_io("Failed to create temporary index", dir, e))?;
    temp.write_all(bytes)
        .map_err(|e| StrataError::storage_io("Failed to write temporary index", temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| StrataError::storage_io("Failed to sync temporary index", temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| StrataError::storage_io("Failed to replace index", path, e.error))?;
    Ok(())
}

/// Creates the temporary file that replaces the index.
///
/// The file takes the permissions of the index it replaces, or the usual
/// umask-filtered `0o666` for a new index, so the result stays readable to
/// whoever serves the repository directory.
fn temp_file_in(dir: &Path, existing: Option<Permissions>) -> io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(Permissions::from_mode(0o666));
    }
    let temp = builder.prefix(".index").tempfile_in(dir)?;
    if let Some(permissions) = existing {
        temp.as_file().set_permissions(permissions)?;
    }
    Ok(temp)
}

/// Exclusive advisory lock on a repository's index.
///
/// Released when dropped.
#[derive(Debug)]
pub struct IndexLock {
    file: File,
    path: PathBuf,
}

impl IndexLock {
    /// Blocks until the writer lock for the repository at `dir` is held.
    pub fn acquire(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .map_err(|e| StrataError::storage_io("Failed to create repository directory", dir, e))?;
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StrataError::storage_io("Failed to open index lock", &path, e))?;
        FileExt::lock_exclusive(&file)
            .map_err(|e| StrataError::storage_io("Failed to lock index", &path, e))?;
        debug!(path = %path.display(), "Acquired index lock");
        Ok(Self { file, path })
    }

    /// Attempts to take the lock without blocking. `None` if another process
    /// holds it.
    pub fn try_acquire(dir: &Path) -> Result<Option<Self>> {
        fs::create_dir_all(dir)
            .map_err(|e| StrataError::storage_io("Failed to create repository directory", dir, e))?;
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StrataError::storage_io("Failed to open index lock", &path, e))?;
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(StrataError::storage_io("Failed to lock index", &path, e)),
        }
    }
}

impl Drop for IndexLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!(path = %self.path.display(), "Released index lock");
    }
}
