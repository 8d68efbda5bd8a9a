use crate::format::Formattable;
use libstrata::format::{
    abbreviate_id, format_optional_size, format_size, format_timestamp, format_timestamp_local,
};
use libstrata::{ArtifactListing, ImageBackend, ImageMetadata, Registry};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

pub mod handlers;

/// One row of `image list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct ImageRow {
    #[tabled(rename = "NAME")]
    pub name: String,

    /// Abbreviated id (formatted for display)
    #[tabled(rename = "ID")]
    #[serde(skip)]
    pub short_id: String,

    /// Stored size (formatted for display)
    #[tabled(rename = "SIZE")]
    #[serde(skip)]
    pub size_display: String,

    #[tabled(rename = "PARENT")]
    #[serde(skip)]
    pub parent_display: String,

    #[tabled(rename = "DESCRIPTION")]
    #[serde(skip)]
    pub description_display: String,

    #[tabled(skip)]
    pub id: String,

    #[tabled(skip)]
    pub size: Option<u64>,

    #[tabled(skip)]
    pub parent: Option<String>,

    #[tabled(skip)]
    pub description: Option<String>,
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

impl From<ArtifactListing> for ImageRow {
    fn from(listing: ArtifactListing) -> Self {
        Self {
            name: listing.name,
            short_id: abbreviate_id(&listing.id).to_string(),
            size_display: format_optional_size(listing.size),
            parent_display: or_dash(listing.parent.as_deref()),
            description_display: or_dash(listing.description.as_deref()),
            id: listing.id,
            size: listing.size,
            parent: listing.parent,
            description: listing.description,
        }
    }
}

/// Every image in the registry, optionally restricted to one repository
pub fn list_images(registry: &mut Registry, repo: Option<&str>) -> Result<Vec<ImageRow>, String> {
    if let Some(repo) = repo
        && !registry.repo_names().contains(&repo)
    {
        return Err(format!("Repository not found: {}", repo));
    }

    let listings = registry.list_all_artifacts().map_err(|e| e.to_string())?;
    Ok(listings
        .into_iter()
        .filter(|listing| repo.is_none_or(|repo| listing.repo == repo))
        .map(ImageRow::from)
        .collect())
}

/// Full record of one image
#[derive(Debug, Clone, Serialize)]
pub struct ImageDetails {
    pub name: String,
    pub repo: String,
    pub id: String,
    pub parent: Option<String>,
    pub tags: Vec<String>,
    pub format: Option<String>,
    pub virtual_size: Option<u64>,
    pub actual_size: Option<u64>,
    pub format_specific: Option<serde_json::Value>,
    pub source_file_hash: Option<String>,
    pub creation_time: chrono::DateTime<chrono::Utc>,
    pub description: Option<String>,
    pub path: String,
}

impl Formattable for ImageDetails {
    fn format_pretty(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Image: {}\n", self.name));
        output.push_str(&format!("ID: {}\n", self.id));
        if let Some(parent) = &self.parent {
            output.push_str(&format!("Parent: {}\n", parent));
        }
        if !self.tags.is_empty() {
            output.push_str(&format!("Tags: {}\n", self.tags.join(", ")));
        }
        if let Some(format) = &self.format {
            output.push_str(&format!("Format: {}\n", format));
        }
        if let Some(size) = self.virtual_size {
            output.push_str(&format!("Virtual size: {}\n", format_size(size)));
        }
        if let Some(size) = self.actual_size {
            output.push_str(&format!("Disk size: {}\n", format_size(size)));
        }
        output.push_str(&format!(
            "Created: {} ({})\n",
            format_timestamp_local(&self.creation_time),
            format_timestamp(&self.creation_time)
        ));
        if let Some(hash) = &self.source_file_hash {
            output.push_str(&format!("Source SHA-256: {}\n", hash));
        }
        if let Some(description) = &self.description {
            output.push_str(&format!("Description: {}\n", description));
        }
        output.push_str(&format!("Path: {}", self.path));
        output
    }
}

/// Resolve a qualified name and collect everything known about the image
pub fn image_details(registry: &mut Registry, name: &str) -> Result<ImageDetails, String> {
    let (repo_name, id) = registry.resolve(name).map_err(|e| e.to_string())?;
    let artifact = registry
        .repo(Some(repo_name.as_str()))
        .and_then(|repo| repo.get(&id).cloned())
        .map_err(|e| e.to_string())?;

    let qualified = format!("{}:{}", repo_name, id);
    let short = registry
        .short_name(Some(&qualified), &repo_name)
        .map_err(|e| e.to_string())?
        .unwrap_or(qualified);
    let parent = registry
        .short_name(artifact.parent.as_deref(), &repo_name)
        .unwrap_or_else(|_| artifact.parent.clone());

    let repo = registry.repo(Some(repo_name.as_str())).map_err(|e| e.to_string())?;
    Ok(ImageDetails {
        name: short,
        repo: repo_name,
        tags: repo.tags_for(&id).into_iter().map(String::from).collect(),
        path: repo.image_path(&id).display().to_string(),
        id,
        parent,
        format: artifact.format,
        virtual_size: artifact.virtual_size,
        actual_size: artifact.actual_size,
        format_specific: artifact.format_specific,
        source_file_hash: artifact.source_file_hash,
        creation_time: artifact.creation_time,
        description: artifact.description,
    })
}

/// Options of `image import`
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Target repository, the default repository when unset
    pub repo: Option<String>,
    /// Parent image, local to the target repository
    pub parent: Option<String>,
    pub description: Option<String>,
    /// Tag to point at the new image
    pub tag: Option<String>,
}

/// Outcome of a successful import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub repo: String,
    pub id: String,
    pub name: String,
}

impl Formattable for ImportResult {
    fn format_pretty(&self) -> String {
        format!("Imported {} ({})", self.name, self.id)
    }
}

/// Import `file` into the target repository through `backend`
pub fn import_image<B>(
    registry: &mut Registry,
    backend: &B,
    file: &Path,
    options: ImportOptions,
) -> Result<ImportResult, String>
where
    B: ImageBackend + ?Sized,
{
    let repo_name = options
        .repo
        .unwrap_or_else(|| registry.default_repo().to_string());

    let parent = match options.parent.as_deref().map(Registry::parse_name) {
        Some((Some(parent_repo), _)) if parent_repo != repo_name => {
            return Err(format!(
                "Parent must be in repository '{}', not '{}'",
                repo_name, parent_repo
            ));
        }
        Some((_, local)) => Some(local.to_string()),
        None => None,
    };

    let metadata = ImageMetadata {
        parent,
        description: options.description,
        ..Default::default()
    };

    let repo = registry
        .repo(Some(repo_name.as_str()))
        .map_err(|e| e.to_string())?;
    let id = repo
        .add_image(backend, file, metadata)
        .map_err(|e| e.to_string())?;
    if let Some(tag) = options.tag.as_deref() {
        repo.add_tag(tag, &id).map_err(|e| e.to_string())?;
    }

    Ok(ImportResult {
        name: format!("{}:{}", repo_name, repo.short_name(&id)),
        repo: repo_name,
        id,
    })
}

/// Point `tag` at the image a qualified name resolves to; the tag lives in
/// that image's repository. Returns the qualified tag.
pub fn tag_image(registry: &mut Registry, tag: &str, name: &str) -> Result<String, String> {
    let (repo_name, local) = Registry::parse_name(name);
    let repo_name = repo_name
        .unwrap_or(registry.default_repo())
        .to_string();
    let repo = registry
        .repo(Some(repo_name.as_str()))
        .map_err(|e| e.to_string())?;
    repo.add_tag(tag, local).map_err(|e| e.to_string())?;
    Ok(format!("{}:{}", repo_name, tag))
}

/// One step of an ancestry chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct AncestorRow {
    #[tabled(rename = "NAME")]
    pub name: String,
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "DESCRIPTION")]
    pub description: String,
}

/// The image and its parents, nearest first
pub fn ancestors(registry: &mut Registry, name: &str) -> Result<Vec<AncestorRow>, String> {
    let (repo_name, id) = registry.resolve(name).map_err(|e| e.to_string())?;
    let repo = registry
        .repo(Some(repo_name.as_str()))
        .map_err(|e| e.to_string())?;
    let chain = repo.ancestors(&id).map_err(|e| e.to_string())?;

    chain
        .into_iter()
        .map(|id| {
            let artifact = repo.get(&id).map_err(|e| e.to_string())?;
            Ok(AncestorRow {
                name: format!("{}:{}", repo_name, repo.short_name(&id)),
                description: or_dash(artifact.description.as_deref()),
                id,
            })
        })
        .collect()
}
