use libstrata::digest::sha256_file;
use libstrata::{
    Config, ImageBackend, ImageInfo, ImageMetadata, Index, RepoConfig, Registry, Repository,
    Result, StrataError,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Backend that stores plain byte copies.
struct CopyBackend;

impl ImageBackend for CopyBackend {
    fn content_hash(&self, source: &Path) -> Result<String> {
        sha256_file(source)
    }

    fn copy(&self, source: &Path, dest: &Path, _parent: Option<&Path>) -> Result<()> {
        fs::copy(source, dest)
            .map(|_| ())
            .map_err(|e| StrataError::storage_io("copy failed", dest, e))
    }

    fn inspect(&self, path: &Path) -> Result<ImageInfo> {
        let len = fs::metadata(path)
            .map_err(|e| StrataError::storage_io("stat failed", path, e))?
            .len();
        Ok(ImageInfo {
            virtual_size: len,
            actual_size: len,
            format: "raw".to_string(),
            format_specific: None,
        })
    }

    fn rebase(&self, _path: &Path, _parent: &Path) -> Result<()> {
        Ok(())
    }
}

#[test]
fn test_version_is_set() {
    assert!(!libstrata::version().is_empty());
}

#[test]
fn test_import_layer_and_list() {
    let storage = TempDir::new().unwrap();
    let sources = TempDir::new().unwrap();
    let base_file = sources.path().join("base.img");
    let layer_file = sources.path().join("layer.img");
    fs::write(&base_file, b"base contents").unwrap();
    fs::write(&layer_file, b"layer contents").unwrap();

    let config = Config::with_local_default(storage.path().display().to_string());
    let mut registry = Registry::new(config).unwrap();

    let repo = registry.repo(None).unwrap();
    let base = repo
        .add_image(&CopyBackend, &base_file, ImageMetadata::described("base"))
        .unwrap();
    repo.add_tag("base", &base).unwrap();
    let layer = repo
        .add_image(
            &CopyBackend,
            &layer_file,
            ImageMetadata::described("layer").with_parent("base"),
        )
        .unwrap();

    assert_eq!(repo.ancestors(&layer).unwrap(), vec![layer.clone(), base.clone()]);

    let listings = registry.list_all_artifacts().unwrap();
    let layer_listing = listings.iter().find(|l| l.id == layer).unwrap();
    assert_eq!(layer_listing.parent.as_deref(), Some("default:base"));
    assert_eq!(layer_listing.size, Some(14));

    // A fresh registry reads the same state back from disk
    let config = Config::with_local_default(storage.path().display().to_string());
    let mut reopened = Registry::new(config).unwrap();
    assert_eq!(
        reopened.resolve("default:base").unwrap(),
        ("default".to_string(), base)
    );
}

#[test]
fn test_persisted_index_round_trips() {
    let storage = TempDir::new().unwrap();
    let config = RepoConfig::local(storage.path().display().to_string());

    let mut repo = Repository::open(&config).unwrap();
    repo.add("aaa111", ImageMetadata::described("base")).unwrap();
    repo.add("bbb222", ImageMetadata::default().with_parent("aaa111"))
        .unwrap();
    repo.write_index().unwrap();
    repo.add_tag("stable", "bbb2").unwrap();

    let text = fs::read_to_string(repo.index_path()).unwrap();
    let parsed = Index::from_yaml(&text).unwrap();
    assert_eq!(&parsed, repo.index());

    let reopened = Repository::open(&config).unwrap();
    assert_eq!(reopened.index(), repo.index());
    assert_eq!(reopened.find("stable").unwrap(), "bbb222");
}

#[test]
fn test_errors_are_distinguishable() {
    let storage = TempDir::new().unwrap();
    let config = RepoConfig::local(storage.path().display().to_string());
    let mut repo = Repository::open(&config).unwrap();

    let missing_parent = repo.add_image(
        &CopyBackend,
        Path::new("/does/not/matter"),
        ImageMetadata::default().with_parent("abc"),
    );
    assert!(matches!(
        missing_parent.unwrap_err(),
        StrataError::ParentNotFound { .. }
    ));

    let missing_target = repo.add_tag("stable", "abc");
    assert!(matches!(
        missing_target.unwrap_err(),
        StrataError::TagTargetNotFound { .. }
    ));
}
