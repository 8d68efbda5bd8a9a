use libstrata::{RepoKind, Registry};
use serde::Serialize;
use tabled::Tabled;

pub mod handlers;

/// One configured repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct RepoRow {
    #[tabled(rename = "NAME")]
    pub name: String,

    #[tabled(rename = "TYPE")]
    pub kind: String,

    #[tabled(rename = "IMAGES")]
    pub images: usize,

    #[tabled(rename = "TAGS")]
    pub tags: usize,

    #[tabled(rename = "PATH")]
    pub path: String,

    /// Remote URL, `-` for local repositories
    #[tabled(rename = "URL")]
    pub url: String,

    #[tabled(rename = "DEFAULT")]
    #[serde(skip)]
    pub default_marker: String,

    #[tabled(skip)]
    pub default: bool,
}

fn kind_name(kind: RepoKind) -> &'static str {
    match kind {
        RepoKind::Local => "local",
        RepoKind::Remote => "remote",
    }
}

/// Every configured repository with its index counts
pub fn list_repos(registry: &mut Registry) -> Result<Vec<RepoRow>, String> {
    let names: Vec<String> = registry.repo_names().into_iter().map(String::from).collect();
    let default_repo = registry.default_repo().to_string();

    names
        .into_iter()
        .map(|name| {
            let repo = registry.repo(Some(name.as_str())).map_err(|e| e.to_string())?;
            let default = name == default_repo;
            Ok(RepoRow {
                kind: kind_name(repo.kind()).to_string(),
                images: repo.images().len(),
                tags: repo.tags().len(),
                path: repo.path().display().to_string(),
                url: repo.url().unwrap_or("-").to_string(),
                default_marker: if default { "*" } else { "" }.to_string(),
                default,
                name,
            })
        })
        .collect()
}

/// Result of fetching one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct FetchOutcome {
    #[tabled(rename = "REPOSITORY")]
    pub repo: String,
    #[tabled(rename = "STATUS")]
    pub status: FetchStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    /// Remote index fetched; number of images it lists
    Updated(usize),
    /// Local repository, nothing to fetch
    Skipped,
    Failed(String),
}

impl std::fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStatus::Updated(images) => write!(f, "updated ({} images)", images),
            FetchStatus::Skipped => write!(f, "local, skipped"),
            FetchStatus::Failed(error) => write!(f, "failed: {}", error),
        }
    }
}

/// Which repositories a fetch applies to
pub fn fetch_targets(
    registry: &Registry,
    name: Option<&str>,
    all: bool,
) -> Result<Vec<String>, String> {
    if all {
        return Ok(registry
            .repo_names()
            .into_iter()
            .map(String::from)
            .collect());
    }

    let name = name.unwrap_or(registry.default_repo());
    if !registry.repo_names().contains(&name) {
        return Err(format!("Repository not found: {}", name));
    }
    Ok(vec![name.to_string()])
}

/// Replace the local index of `name` with its remote index
pub fn fetch_repo(registry: &mut Registry, name: &str) -> FetchOutcome {
    let status = match registry.repo(Some(name)) {
        Ok(repo) if repo.kind() == RepoKind::Local => FetchStatus::Skipped,
        Ok(repo) => match repo.fetch() {
            Ok(()) => FetchStatus::Updated(repo.images().len()),
            Err(e) => FetchStatus::Failed(e.to_string()),
        },
        Err(e) => FetchStatus::Failed(e.to_string()),
    };

    FetchOutcome {
        repo: name.to_string(),
        status,
    }
}

/// A stored image file with no index entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct OrphanRow {
    #[tabled(rename = "REPOSITORY")]
    pub repo: String,
    #[tabled(rename = "PATH")]
    pub path: String,
}

/// Stored image files of one repository (or all) missing from their index
pub fn find_orphans(registry: &mut Registry, name: Option<&str>) -> Result<Vec<OrphanRow>, String> {
    let names: Vec<String> = match name {
        Some(name) => vec![name.to_string()],
        None => registry.repo_names().into_iter().map(String::from).collect(),
    };

    let mut rows = Vec::new();
    for name in names {
        let repo = registry.repo(Some(name.as_str())).map_err(|e| e.to_string())?;
        for path in repo.orphans().map_err(|e| e.to_string())? {
            rows.push(OrphanRow {
                repo: name.clone(),
                path: path.display().to_string(),
            });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests;
