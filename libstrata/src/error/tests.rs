use super::*;
use std::error::Error;

#[test]
fn test_parent_not_found_message() {
    let err = StrataError::parent_not_found("aaa111");

    assert!(matches!(err, StrataError::ParentNotFound { .. }));
    assert!(err.to_string().contains("aaa111"));
}

#[test]
fn test_tag_target_not_found_message() {
    let err = StrataError::tag_target_not_found("stable", "nope");

    assert!(err.to_string().contains("stable"));
    assert!(err.to_string().contains("nope"));
}

#[test]
fn test_broken_ancestry_chain_names_both_ends() {
    let err = StrataError::broken_ancestry_chain("bbb222", "aaa111");

    assert!(matches!(err, StrataError::BrokenAncestryChain { .. }));
    assert!(err.to_string().contains("bbb222"));
    assert!(err.to_string().contains("aaa111"));
}

#[test]
fn test_ambiguous_reference_lists_candidates() {
    let err = StrataError::ambiguous_reference(
        "abc",
        vec!["abc123".to_string(), "abc456".to_string()],
    );

    let message = err.to_string();
    assert!(message.contains("'abc'"));
    assert!(message.contains("2 images"));
    assert!(message.contains("abc123, abc456"));
}

#[test]
fn test_index_version_mismatch_message() {
    let err = StrataError::index_version_mismatch(7, 1, Some("/srv/index.yaml".to_string()));

    assert!(err.to_string().contains("7"));
    assert!(err.to_string().contains("supported: 1"));
}

#[test]
fn test_remote_fetch_with_source_chains_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
    let err = StrataError::remote_fetch_with_source("http://localhost/", "connect failed", io_err);

    assert!(err.source().is_some());
    assert!(err.to_string().contains("http://localhost/"));
}

#[test]
fn test_remote_fetch_without_source() {
    let err = StrataError::remote_fetch("http://localhost/", "HTTP 500");

    assert!(err.source().is_none());
}

#[test]
fn test_storage_io_records_path() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err = StrataError::storage_io("Failed to write index", "/srv/index.yaml", io_err);

    match &err {
        StrataError::StorageIo { path, .. } => {
            assert_eq!(path.as_deref(), Some("/srv/index.yaml"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.source().is_some());
}

#[test]
fn test_not_found_message() {
    let err = StrataError::not_found("repository", "upstream");

    assert!(err.to_string().contains("repository"));
    assert!(err.to_string().contains("upstream"));
}

#[test]
fn test_config_error_with_path() {
    let err = StrataError::config("missing url", Some("/etc/strata.yaml"));

    match err {
        StrataError::Config { path, source, .. } => {
            assert_eq!(path, Some("/etc/strata.yaml".to_string()));
            assert!(source.is_none());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_backend_with_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "qemu-img");
    let err = StrataError::backend_with_source("Failed to run qemu-img", io_err);

    assert!(matches!(err, StrataError::Backend { .. }));
    assert!(err.source().is_some());
}

#[test]
fn test_only_remote_fetch_is_retryable() {
    assert!(StrataError::remote_fetch("http://x/", "timeout").is_retryable());
    assert!(!StrataError::parent_not_found("aaa").is_retryable());
    assert!(!StrataError::validation("bad").is_retryable());
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StrataError>();
}
