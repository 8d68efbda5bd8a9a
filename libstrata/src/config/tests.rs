use super::*;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.default_repo, "default");
    assert_eq!(config.network.timeout, 30);
    assert!(config.repos.is_empty());
}

#[test]
fn test_from_str_empty_yaml() {
    let config = Config::from_yaml_str("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_from_str_partial_yaml() {
    let yaml = r#"
network:
  timeout: 5
"#;
    let config = Config::from_yaml_str(yaml).unwrap();

    assert_eq!(config.network.timeout, 5);
    assert_eq!(config.default_repo, "default");
}

#[test]
fn test_from_str_full_yaml() {
    let yaml = r#"
default_repo: local
network:
  timeout: 10
repos:
  local:
    type: local
    path: /srv/images
  upstream:
    type: remote
    path: /var/cache/strata/upstream
    url: "https://images.example.com/base/"
"#;
    let config = Config::from_yaml_str(yaml).unwrap();

    assert_eq!(config.default_repo, "local");
    assert_eq!(config.network.timeout, 10);
    assert_eq!(config.repos.len(), 2);
    assert_eq!(config.repos["local"], RepoConfig::local("/srv/images"));
    assert_eq!(
        config.repos["upstream"],
        RepoConfig::remote(
            "/var/cache/strata/upstream",
            "https://images.example.com/base/"
        )
    );
}

#[test]
fn test_repo_type_defaults_to_local() {
    let yaml = r#"
repos:
  default:
    path: /srv/images
"#;
    let config = Config::from_yaml_str(yaml).unwrap();
    assert_eq!(config.repos["default"].kind, RepoKind::Local);
}

#[test]
fn test_remote_without_url_is_rejected() {
    let yaml = r#"
repos:
  default:
    type: remote
    path: /srv/cache
"#;
    let result = Config::from_yaml_str(yaml);
    assert!(matches!(result.unwrap_err(), StrataError::Config { .. }));
}

#[test]
fn test_missing_default_repo_is_rejected() {
    let yaml = r#"
default_repo: prod
repos:
  local:
    path: /srv/images
"#;
    let err = Config::from_yaml_str(yaml).unwrap_err();
    assert!(err.to_string().contains("prod"));
}

#[test]
fn test_invalid_repo_type_is_rejected() {
    let yaml = r#"
repos:
  default:
    type: ftp
    path: /srv/images
"#;
    assert!(Config::from_yaml_str(yaml).is_err());
}

#[test]
fn test_unknown_field_is_ignored() {
    let result = Config::from_yaml_str("unknown_field: true");
    assert!(result.is_ok());
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        "repos:\n  default:\n    type: local\n    path: /srv/images\n",
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.repos["default"].path, "/srv/images");
}

#[test]
fn test_load_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.yaml");

    match Config::load(&path).unwrap_err() {
        StrataError::Config { path: reported, .. } => {
            assert_eq!(reported, Some(path.display().to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_with_local_default() {
    let config = Config::with_local_default("/srv/images");

    assert!(config.validate().is_ok());
    assert_eq!(config.repos[DEFAULT_REPO_NAME], RepoConfig::local("/srv/images"));
}

#[test]
fn test_expand_path_leaves_absolute_paths() {
    assert_eq!(expand_path("/srv/images"), PathBuf::from("/srv/images"));
    assert_eq!(expand_path("relative/dir"), PathBuf::from("relative/dir"));
}

#[test]
fn test_expand_path_home() {
    if let Some(home) = dirs::home_dir() {
        assert_eq!(expand_path("~"), home);
        assert_eq!(expand_path("~/images"), home.join("images"));
    }
}
