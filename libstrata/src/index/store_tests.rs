use super::*;
use crate::index::ImageMetadata;
use tempfile::tempdir;

fn sample_index() -> Index {
    let mut index = Index::default();
    index
        .add("aaa111", ImageMetadata::described("base"))
        .unwrap();
    index
        .add("bbb222", ImageMetadata::default().with_parent("aaa111"))
        .unwrap();
    index.set_tag("stable", "aaa111").unwrap();
    index
}

#[test]
fn test_load_missing_index_is_empty() {
    let dir = tempdir().unwrap();
    let (index, fingerprint) = load(&index_path(dir.path())).unwrap();

    assert_eq!(index, Index::default());
    assert!(fingerprint.is_none());
}

#[test]
fn test_save_then_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = index_path(dir.path());
    let index = sample_index();

    let written = save(&path, &index).unwrap();
    let (loaded, read) = load(&path).unwrap();

    assert_eq!(loaded, index);
    assert_eq!(read, Some(written));
}

#[test]
fn test_save_creates_repository_directory() {
    let dir = tempdir().unwrap();
    let path = index_path(&dir.path().join("nested").join("repo"));

    save(&path, &Index::default()).unwrap();
    assert!(path.exists());
}

#[test]
fn test_save_leaves_no_temporary_files() {
    let dir = tempdir().unwrap();
    let path = index_path(dir.path());

    save(&path, &sample_index()).unwrap();
    save(&path, &Index::default()).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![INDEX_FILE.to_string()]);
}

#[test]
fn test_fingerprint_tracks_content() {
    let dir = tempdir().unwrap();
    let path = index_path(dir.path());
    assert!(fingerprint(&path).unwrap().is_none());

    let first = save(&path, &Index::default()).unwrap();
    assert_eq!(fingerprint(&path).unwrap(), Some(first.clone()));

    let second = save(&path, &sample_index()).unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_load_unknown_version_reports_path() {
    let dir = tempdir().unwrap();
    let path = index_path(dir.path());
    std::fs::write(&path, "version: 99\nimages: {}\ntags: {}\n").unwrap();

    match load(&path).unwrap_err() {
        StrataError::IndexVersionMismatch {
            found,
            supported,
            path: reported,
        } => {
            assert_eq!(found, 99);
            assert_eq!(supported, crate::index::INDEX_VERSION);
            assert_eq!(reported, Some(path.display().to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_load_garbage_is_validation_error() {
    let dir = tempdir().unwrap();
    let path = index_path(dir.path());
    std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

    assert!(matches!(
        load(&path).unwrap_err(),
        StrataError::Validation { .. }
    ));
}

#[test]
fn test_lock_is_exclusive_until_dropped() {
    let dir = tempdir().unwrap();

    let held = IndexLock::acquire(dir.path()).unwrap();
    assert!(IndexLock::try_acquire(dir.path()).unwrap().is_none());

    drop(held);
    assert!(IndexLock::try_acquire(dir.path()).unwrap().is_some());
}

#[cfg(unix)]
#[test]
fn test_save_uses_default_file_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = index_path(dir.path());
    save(&path, &sample_index()).unwrap();

    let plain = dir.path().join("plain");
    std::fs::File::create(&plain).unwrap();

    let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(&path), mode(&plain));
}

#[cfg(unix)]
#[test]
fn test_save_keeps_existing_index_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = index_path(dir.path());
    save(&path, &Index::default()).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

    save(&path, &sample_index()).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o640);
}
