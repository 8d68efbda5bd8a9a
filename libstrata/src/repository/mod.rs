//! A single image repository.
//!
//! A [`Repository`] owns one storage directory holding `index.yaml` and one
//! `<id>.qcow2` file per stored image. Local repositories are authoritative.
//! Remote repositories keep a disposable local copy of the index served at
//! their URL, replaced wholesale by [`Repository::fetch`].
//!
//! Every persisted mutation runs as a transaction: take the advisory index
//! lock, reload the index if another process changed it since it was read,
//! apply the change to a copy, write the copy atomically, release the lock.
//! A mutation that fails leaves both the in-memory and the on-disk index as
//! they were.

use crate::backend::ImageBackend;
use crate::client::{Client, ClientConfig};
use crate::config::{RepoConfig, RepoKind};
use crate::digest::{sha256_bytes, sha256_file, validate_id};
use crate::error::{Result, StrataError};
use crate::index::store::{self, IndexLock};
use crate::index::{Artifact, ImageMetadata, Index};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;


/// File extension of stored images.
pub const IMAGE_EXTENSION: &str = "qcow2";

/// One repository: its storage directory and the index describing it.
#[derive(Debug)]
pub struct Repository {
    path: PathBuf,
    kind: RepoKind,
    url: Option<String>,
    client_config: ClientConfig,
    index: Index,
    /// Fingerprint of the on-disk index `index` was loaded from or last
    /// written as. `None` when there was no index file.
    fingerprint: Option<String>,
    /// Records added with [`Repository::add`] that are not yet persisted.
    staged: Vec<Artifact>,
}

impl Repository {
    /// Opens the repository described by `config`, loading its index if one
    /// exists.
    pub fn open(config: &RepoConfig) -> Result<Self> {
        Self::open_with_client(config, ClientConfig::default())
    }

    /// Opens a repository whose remote fetches use `client_config`.
    pub fn open_with_client(config: &RepoConfig, client_config: ClientConfig) -> Result<Self> {
        if config.kind == RepoKind::Remote && config.url.is_none() {
            return Err(StrataError::config(
                format!("Remote repository at '{}' has no url", config.path),
                None,
            ));
        }

        let path = config.storage_path();
        let index_path = store::index_path(&path);
        let (index, fingerprint) = match store::load(&index_path) {
            Ok(loaded) => loaded,
            // The remote cache is replaced by the next fetch
            Err(e @ (StrataError::IndexVersionMismatch { .. } | StrataError::Validation { .. }))
                if config.kind == RepoKind::Remote =>
            {
                warn!(
                    path = %index_path.display(),
                    error = %e,
                    "Ignoring unreadable remote index cache until the next fetch"
                );
                (Index::default(), store::fingerprint(&index_path)?)
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            path,
            kind: config.kind,
            url: config.url.clone(),
            client_config,
            index,
            fingerprint,
            staged: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> RepoKind {
        self.kind
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// The in-memory index.
    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn images(&self) -> &BTreeMap<String, Artifact> {
        &self.index.images
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.index.tags
    }

    pub fn index_path(&self) -> PathBuf {
        store::index_path(&self.path)
    }

    /// Storage location of the image with content hash `id`.
    pub fn image_path(&self, id: &str) -> PathBuf {
        self.path.join(format!("{}.{}", id, IMAGE_EXTENSION))
    }

    /// Resolves an id, unique id prefix or tag to a full id.
    pub fn find(&self, name: &str) -> Result<String> {
        self.index.find(name)
    }

    /// Resolves a name and returns its record.
    pub fn get(&self, name: &str) -> Result<&Artifact> {
        self.index.get(name)
    }

    /// Records an image in memory without persisting it.
    ///
    /// The record is written by the next persisted mutation or by
    /// [`Repository::write_index`].
    pub fn add(&mut self, id: &str, metadata: ImageMetadata) -> Result<&Artifact> {
        let artifact = self.index.add(id, metadata)?.clone();
        self.staged.retain(|staged| staged.id != artifact.id);
        self.staged.push(artifact);
        self.index.get(id)
    }

    /// Persists the in-memory index, including staged records.
    pub fn write_index(&mut self) -> Result<()> {
        self.transact(|_| Ok(()))
    }

    /// Imports `source` into the repository and returns its content hash.
    ///
    /// When `metadata.parent` is set the image is stored as a delta against
    /// the parent's stored file and recorded with the parent's full id.
    ///
    /// # Errors
    ///
    /// - [`StrataError::ParentNotFound`] if the parent does not resolve; the
    ///   backend is not invoked and nothing is written
    /// - [`StrataError::Backend`] if any backend step fails
    ///
    /// A failure after the image file has been written leaves that file in
    /// storage without an index entry. [`Repository::orphans`] lists such
    /// files.
    pub fn add_image<B>(
        &mut self,
        backend: &B,
        source: &Path,
        metadata: ImageMetadata,
    ) -> Result<String>
    where
        B: ImageBackend + ?Sized,
    {
        let parent = match metadata.parent.as_deref() {
            Some(name) => match self.index.get(name) {
                Ok(artifact) => Some(artifact.id.clone()),
                Err(StrataError::NotFound { .. }) => {
                    return Err(StrataError::parent_not_found(name));
                }
                Err(e) => return Err(e),
            },
            None => None,
        };

        let id = backend.content_hash(source)?;
        validate_id(&id)?;

        fs::create_dir_all(&self.path).map_err(|e| {
            StrataError::storage_io("Failed to create repository directory", &self.path, e)
        })?;

        let dest = self.image_path(&id);
        let parent_path = parent.as_deref().map(|parent| self.image_path(parent));
        info!(
            id = %id,
            source = %source.display(),
            parent = ?parent,
            "Storing image"
        );
        backend.copy(source, &dest, parent_path.as_deref())?;

        let already_indexed = self.index.images.contains_key(&id);
        let result = self.record_stored_image(
            backend,
            source,
            &dest,
            &id,
            parent.zip(parent_path),
            metadata,
        );

        if let Err(e) = &result
            && !already_indexed
        {
            warn!(
                path = %dest.display(),
                error = %e,
                "Import failed after the image was stored; file is not referenced by the index"
            );
        }
        result
    }

    /// Steps of an import that run once the image file exists in storage.
    fn record_stored_image<B>(
        &mut self,
        backend: &B,
        source: &Path,
        dest: &Path,
        id: &str,
        parent: Option<(String, PathBuf)>,
        mut metadata: ImageMetadata,
    ) -> Result<String>
    where
        B: ImageBackend + ?Sized,
    {
        let info = backend.inspect(dest)?;
        metadata.virtual_size = Some(info.virtual_size);
        metadata.actual_size = Some(info.actual_size);
        metadata.format = Some(info.format);
        if info.format_specific.is_some() {
            metadata.format_specific = info.format_specific;
        }

        metadata.source_file_hash = Some(sha256_file(source)?);

        metadata.parent = match parent {
            Some((parent_id, parent_path)) => {
                backend.rebase(dest, &parent_path)?;
                Some(parent_id)
            }
            None => None,
        };

        self.transact(|index| index.add(id, metadata).map(|_| ()))?;
        info!(id = %id, path = %dest.display(), "Imported image");
        Ok(id.to_string())
    }

    /// Points `tag` at the image `name` resolves to and persists the change.
    /// Returns the tagged id.
    ///
    /// # Errors
    ///
    /// [`StrataError::TagTargetNotFound`] if `name` does not resolve, or
    /// [`StrataError::AmbiguousReference`] if it matches several ids. No tag is
    /// recorded in either case.
    pub fn add_tag(&mut self, tag: &str, name: &str) -> Result<String> {
        let id = self.transact(|index| index.set_tag(tag, name))?;
        info!(tag = %tag, id = %id, "Tagged image");
        Ok(id)
    }

    /// Ids from `name` up through its parents.
    pub fn ancestors(&self, name: &str) -> Result<Vec<String>> {
        self.index.ancestors(name)
    }

    /// Shortest display form of `id`: a tag when one resolves back to it,
    /// otherwise a unique id prefix.
    pub fn short_name(&self, id: &str) -> String {
        self.index.short_name(id)
    }

    /// Sorted tags pointing at `id`.
    pub fn tags_for(&self, id: &str) -> Vec<&str> {
        self.index.tags_for(id)
    }

    /// Replaces the local index with the one served by the remote repository.
    ///
    /// Does nothing for local repositories. On any failure the local index,
    /// in memory and on disk, is left as it was.
    ///
    /// # Errors
    ///
    /// - [`StrataError::RemoteFetchFailed`] for network, HTTP or parse errors
    /// - [`StrataError::IndexVersionMismatch`] if the remote index uses an
    ///   unsupported schema version
    pub fn fetch(&mut self) -> Result<()> {
        let url = match (self.kind, self.url.as_deref()) {
            (RepoKind::Local, _) => {
                debug!(path = %self.path.display(), "Local repository, nothing to fetch");
                return Ok(());
            }
            (RepoKind::Remote, Some(url)) => url,
            (RepoKind::Remote, None) => {
                return Err(StrataError::config("Remote repository has no url", None));
            }
        };

        let client = Client::with_config(url, self.client_config.clone())?;
        info!(url = %client.base_url(), "Fetching remote index");
        let remote = client.fetch_index()?;

        let _lock = self.lock()?;
        let fingerprint = store::save(&self.index_path(), &remote)?;
        info!(
            url = %client.base_url(),
            images = remote.images.len(),
            tags = remote.tags.len(),
            "Replaced local index with remote index"
        );
        self.index = remote;
        self.fingerprint = Some(fingerprint);
        self.staged.clear();
        Ok(())
    }

    /// Stored image files that no index entry refers to, sorted by path.
    pub fn orphans(&self) -> Result<Vec<PathBuf>> {
        if !self.path.is_dir() {
            return Ok(Vec::new());
        }

        let mut orphans = Vec::new();
        for entry in WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(self.path.as_path()).to_path_buf();
                StrataError::storage_io("Failed to scan repository", path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension() != Some(OsStr::new(IMAGE_EXTENSION)) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(OsStr::to_str) else {
                continue;
            };
            if !self.index.images.contains_key(id) {
                orphans.push(path.to_path_buf());
            }
        }
        Ok(orphans)
    }

    /// Takes the writer lock, blocking if another writer holds it.
    fn lock(&self) -> Result<IndexLock> {
        if let Some(lock) = IndexLock::try_acquire(&self.path)? {
            return Ok(lock);
        }
        debug!(path = %self.path.display(), "Index locked by another writer, waiting");
        IndexLock::acquire(&self.path)
    }

    /// Runs `mutate` against the current index under the writer lock and
    /// persists the result.
    fn transact<T, F>(&mut self, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut Index) -> Result<T>,
    {
        let _lock = self.lock()?;
        self.reload_if_changed()?;

        let mut next = self.index.clone();
        let value = mutate(&mut next)?;

        let fingerprint = store::save(&self.index_path(), &next)?;
        self.index = next;
        self.fingerprint = Some(fingerprint);
        self.staged.clear();
        Ok(value)
    }

    /// Re-reads the index if the file on disk is not the one this repository
    /// last saw. Staged records are carried over into the reloaded index.
    fn reload_if_changed(&mut self) -> Result<()> {
        let path = self.index_path();
        let bytes = store::read_bytes(&path)?;
        let on_disk = bytes.as_deref().map(sha256_bytes);
        if on_disk == self.fingerprint {
            return Ok(());
        }

        warn!(
            path = %path.display(),
            "Index changed on disk since it was read, reloading"
        );
        let mut index = match bytes {
            Some(bytes) => store::parse_bytes(&bytes, &path)?,
            None => Index::default(),
        };
        for artifact in &self.staged {
            index.images.insert(artifact.id.clone(), artifact.clone());
        }
        self.index = index;
        self.fingerprint = on_disk;
        Ok(())
    }
}
