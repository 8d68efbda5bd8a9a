use super::*;
use libstrata::{Config, ImageMetadata, RepoConfig};
use std::fs;
use tempfile::TempDir;

/// Registry with a local `main` (default) and a remote `upstream`
fn registry(main: &TempDir, upstream: &TempDir, url: &str) -> Registry {
    let mut config = Config {
        default_repo: "main".to_string(),
        ..Default::default()
    };
    config.repos.insert(
        "main".to_string(),
        RepoConfig::local(main.path().display().to_string()),
    );
    config.repos.insert(
        "upstream".to_string(),
        RepoConfig::remote(upstream.path().display().to_string(), url),
    );
    config.network.timeout = 2;
    Registry::new(config).unwrap()
}

#[test]
fn test_list_repos() {
    let main = TempDir::new().unwrap();
    let upstream = TempDir::new().unwrap();
    let mut registry = registry(&main, &upstream, "http://127.0.0.1:9/images");

    let repo = registry.repo(Some("main")).unwrap();
    repo.add("aaa111", ImageMetadata::default()).unwrap();
    repo.write_index().unwrap();
    repo.add_tag("stable", "aaa111").unwrap();

    let rows = list_repos(&mut registry).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "main");
    assert_eq!(rows[0].kind, "local");
    assert_eq!(rows[0].images, 1);
    assert_eq!(rows[0].tags, 1);
    assert_eq!(rows[0].url, "-");
    assert!(rows[0].default);
    assert_eq!(rows[1].name, "upstream");
    assert_eq!(rows[1].kind, "remote");
    assert_eq!(rows[1].url, "http://127.0.0.1:9/images");
    assert!(!rows[1].default);
}

#[test]
fn test_fetch_targets() {
    let main = TempDir::new().unwrap();
    let upstream = TempDir::new().unwrap();
    let registry = registry(&main, &upstream, "http://127.0.0.1:9/");

    assert_eq!(fetch_targets(&registry, None, false).unwrap(), vec!["main"]);
    assert_eq!(
        fetch_targets(&registry, Some("upstream"), false).unwrap(),
        vec!["upstream"]
    );
    assert_eq!(
        fetch_targets(&registry, None, true).unwrap(),
        vec!["main", "upstream"]
    );
    assert!(fetch_targets(&registry, Some("nope"), false).is_err());
}

#[test]
fn test_fetch_local_repo_is_skipped() {
    let main = TempDir::new().unwrap();
    let upstream = TempDir::new().unwrap();
    let mut registry = registry(&main, &upstream, "http://127.0.0.1:9/");

    let outcome = fetch_repo(&mut registry, "main");

    assert_eq!(outcome.status, FetchStatus::Skipped);
    assert!(!main.path().join("index.yaml").exists());
}

#[test]
fn test_fetch_unreachable_remote_fails() {
    let main = TempDir::new().unwrap();
    let upstream = TempDir::new().unwrap();
    let mut registry = registry(&main, &upstream, "http://127.0.0.1:9/");

    let outcome = fetch_repo(&mut registry, "upstream");

    assert!(matches!(outcome.status, FetchStatus::Failed(_)));
    assert!(outcome.status.to_string().starts_with("failed:"));
    assert!(!upstream.path().join("index.yaml").exists());
}

#[test]
fn test_fetch_status_display() {
    assert_eq!(FetchStatus::Updated(3).to_string(), "updated (3 images)");
    assert_eq!(FetchStatus::Skipped.to_string(), "local, skipped");
}

#[test]
fn test_find_orphans() {
    let main = TempDir::new().unwrap();
    let upstream = TempDir::new().unwrap();
    let mut registry = registry(&main, &upstream, "http://127.0.0.1:9/");

    let repo = registry.repo(Some("main")).unwrap();
    repo.add("aaa111", ImageMetadata::default()).unwrap();
    repo.write_index().unwrap();
    fs::write(main.path().join("aaa111.qcow2"), b"kept").unwrap();
    fs::write(main.path().join("bbb222.qcow2"), b"stray").unwrap();

    let orphans = find_orphans(&mut registry, None).unwrap();

    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].repo, "main");
    assert!(orphans[0].path.ends_with("bbb222.qcow2"));

    assert!(find_orphans(&mut registry, Some("upstream")).unwrap().is_empty());
}
