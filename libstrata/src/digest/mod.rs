//! Content digests.
//!
//! Image ids are lowercase hex digests computed by the conversion backend.
//! This module holds the SHA-256 helpers used for source-file hashes and index
//! fingerprints, plus validation of id strings coming from callers or remote
//! indexes.

use crate::error::{Result, StrataError};
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;


/// Returns the lowercase hex SHA-256 of `bytes`.
///
/// # Examples
///
/// ```
/// use libstrata::digest::sha256_bytes;
///
/// assert_eq!(
///     sha256_bytes(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn sha256_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Streams a file through SHA-256 and returns the lowercase hex digest.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path)
        .map_err(|e| StrataError::storage_io("Failed to open file for hashing", path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)
        .map_err(|e| StrataError::storage_io("Failed to read file for hashing", path, e))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Checks that `id` is a non-empty lowercase hex string.
///
/// Ids double as file names in repository storage, so anything else is
/// rejected before it reaches the filesystem.
///
/// # Examples
///
/// ```
/// use libstrata::digest::validate_id;
///
/// assert!(validate_id("aaa111").is_ok());
/// assert!(validate_id("../etc/passwd").is_err());
/// ```
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(StrataError::validation("Image id cannot be empty"));
    }
    if !id.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
        return Err(StrataError::validation(format!(
            "Invalid image id '{}': expected lowercase hex digest",
            id
        )));
    }
    Ok(())
}
