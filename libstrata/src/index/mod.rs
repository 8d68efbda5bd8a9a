//! Repository index: images, tags and name resolution.
//!
//! An [`Index`] is the full persisted state of one repository. It maps content
//! hashes to [`Artifact`] records and tag names to content hashes. All lookups
//! that turn a user-supplied name into a canonical id live here so that the
//! repository and registry layers share one resolution policy:
//!
//! 1. an id equal to the name wins outright,
//! 2. otherwise the name is a hash prefix; one match resolves, several matches
//!    are an [`StrataError::AmbiguousReference`],
//! 3. otherwise the name is looked up as an exact tag.

use crate::digest::validate_id;
use crate::error::{Result, StrataError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod store;


/// Index schema version written by this library.
pub const INDEX_VERSION: u32 = 1;

/// Minimum length of an abbreviated id.
pub const SHORT_ID_LEN: usize = 12;

/// A stored image, keyed by its content hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Artifact {
    /// Content hash of the stored image.
    pub id: String,
    /// Id of the image this one is a delta against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_specific: Option<serde_json::Value>,
    /// SHA-256 of the file the image was imported from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file_hash: Option<String>,
    pub creation_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Caller-supplied fields for a new image.
///
/// The size and format fields are overwritten with what the conversion
/// backend reports once the image is stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImageMetadata {
    pub parent: Option<String>,
    pub virtual_size: Option<u64>,
    pub actual_size: Option<u64>,
    pub format: Option<String>,
    pub format_specific: Option<serde_json::Value>,
    pub source_file_hash: Option<String>,
    pub description: Option<String>,
}

impl ImageMetadata {
    /// Metadata with only a description set.
    pub fn described<S: Into<String>>(description: S) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }

    /// Sets the parent image name.
    pub fn with_parent<S: Into<String>>(mut self, parent: S) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

impl Artifact {
    fn from_metadata(id: &str, metadata: ImageMetadata, creation_time: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            parent: metadata.parent,
            virtual_size: metadata.virtual_size,
            actual_size: metadata.actual_size,
            format: metadata.format,
            format_specific: metadata.format_specific,
            source_file_hash: metadata.source_file_hash,
            creation_time,
            description: metadata.description,
        }
    }
}

/// Only the version field, read first so that an unknown schema is rejected
/// before the rest of the document is interpreted.
#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

/// The persisted state of one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub version: u32,
    #[serde(default)]
    pub images: BTreeMap<String, Artifact>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Default for Index {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            images: BTreeMap::new(),
            tags: BTreeMap::new(),
        }
    }
}

impl Index {
    /// Parses and validates an index document.
    ///
    /// # Errors
    ///
    /// - [`StrataError::IndexVersionMismatch`] if the document declares a
    ///   version other than [`INDEX_VERSION`]
    /// - [`StrataError::Validation`] if the document is malformed or an image
    ///   is stored under a key other than its own id
    pub fn from_yaml(s: &str) -> Result<Self> {
        let header: VersionHeader = serde_yaml::from_str(s)
            .map_err(|e| StrataError::validation_with_source("Failed to read index version", e))?;
        if header.version != INDEX_VERSION {
            return Err(StrataError::index_version_mismatch(
                header.version,
                INDEX_VERSION,
                None,
            ));
        }

        let index: Index = serde_yaml::from_str(s)
            .map_err(|e| StrataError::validation_with_source("Failed to parse index", e))?;
        index.validate()?;
        Ok(index)
    }

    /// Serializes the index as a YAML document.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| StrataError::validation_with_source("Failed to serialize index", e))
    }

    /// Checks structural invariants: every image is keyed by its own id and
    /// every id is a hex digest.
    pub fn validate(&self) -> Result<()> {
        for (key, artifact) in &self.images {
            if key != &artifact.id {
                return Err(StrataError::validation(format!(
                    "Index entry '{}' holds image with id '{}'",
                    key, artifact.id
                )));
            }
            validate_id(key)?;
        }
        Ok(())
    }

    /// Resolves a hash prefix or tag name to a full image id.
    ///
    /// # Errors
    ///
    /// - [`StrataError::AmbiguousReference`] if the name is a prefix of more
    ///   than one id and equal to none
    /// - [`StrataError::NotFound`] if neither an id nor a tag matches
    pub fn find(&self, name: &str) -> Result<String> {
        if name.is_empty() {
            return Err(StrataError::not_found("image", name));
        }
        if self.images.contains_key(name) {
            return Ok(name.to_string());
        }

        let mut candidates: Vec<String> = self
            .images
            .keys()
            .filter(|id| id.starts_with(name))
            .cloned()
            .collect();

        match candidates.len() {
            0 => self
                .tags
                .get(name)
                .cloned()
                .ok_or_else(|| StrataError::not_found("image", name)),
            1 => Ok(candidates.remove(0)),
            _ => Err(StrataError::ambiguous_reference(name, candidates)),
        }
    }

    /// Resolves a name and returns the image record.
    ///
    /// A tag whose target is not in the index resolves to `NotFound` here.
    pub fn get(&self, name: &str) -> Result<&Artifact> {
        let id = self.find(name)?;
        self.images
            .get(&id)
            .ok_or_else(|| StrataError::not_found("image", id.as_str()))
    }

    /// Inserts an image record, stamping its creation time.
    ///
    /// Re-adding an existing id replaces its metadata but keeps the original
    /// creation time.
    pub fn add(&mut self, id: &str, metadata: ImageMetadata) -> Result<&Artifact> {
        validate_id(id)?;
        let creation_time = self
            .images
            .get(id)
            .map(|existing| existing.creation_time)
            .unwrap_or_else(Utc::now);
        let artifact = Artifact::from_metadata(id, metadata, creation_time);
        self.images.insert(id.to_string(), artifact);
        self.images
            .get(id)
            .ok_or_else(|| StrataError::not_found("image", id))
    }

    /// Points `tag` at the image `name` resolves to, replacing any previous
    /// target. Returns the resolved id.
    pub fn set_tag(&mut self, tag: &str, name: &str) -> Result<String> {
        if tag.is_empty() {
            return Err(StrataError::validation("Tag name cannot be empty"));
        }
        let id = self.find(name).map_err(|e| match e {
            StrataError::NotFound { .. } => StrataError::tag_target_not_found(tag, name),
            other => other,
        })?;
        self.tags.insert(tag.to_string(), id.clone());
        Ok(id)
    }

    /// Returns the ids from `name` up through its chain of parents.
    ///
    /// Each parent is looked up afresh. A parent that does not resolve, or a
    /// chain that loops back on itself, is a [`StrataError::BrokenAncestryChain`].
    pub fn ancestors(&self, name: &str) -> Result<Vec<String>> {
        let mut image = self.get(name)?;
        let mut chain = vec![image.id.clone()];

        while let Some(parent) = image.parent.as_deref() {
            let next = self
                .get(parent)
                .map_err(|_| StrataError::broken_ancestry_chain(image.id.as_str(), parent))?;
            if chain.contains(&next.id) {
                return Err(StrataError::broken_ancestry_chain(image.id.as_str(), parent));
            }
            chain.push(next.id.clone());
            image = next;
        }

        Ok(chain)
    }

    /// Sorted tag names pointing at `id`.
    pub fn tags_for(&self, id: &str) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|(_, target)| target.as_str() == id)
            .map(|(tag, _)| tag.as_str())
            .collect()
    }

    /// Shortest display form of an id that resolves back to it.
    ///
    /// Prefers the first tag pointing at the id, provided the tag is not
    /// shadowed by an id prefix. Otherwise returns the shortest unique prefix
    /// of at least [`SHORT_ID_LEN`] characters.
    pub fn short_name(&self, id: &str) -> String {
        if let Some(tag) = self
            .tags_for(id)
            .into_iter()
            .find(|tag| self.find(tag).is_ok_and(|resolved| resolved == id))
        {
            return tag.to_string();
        }

        let mut len = SHORT_ID_LEN.min(id.len());
        while let Some(prefix) = id.get(..len) {
            let clashes = self
                .images
                .keys()
                .any(|other| other != id && other.starts_with(prefix));
            if !clashes || len >= id.len() {
                return prefix.to_string();
            }
            len += 1;
        }
        id.to_string()
    }
}
