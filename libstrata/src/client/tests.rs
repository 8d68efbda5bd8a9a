use super::*;

const INDEX_YAML: &str = r#"version: 1
images:
  aaa111:
    id: aaa111
    actual-size: 1048576
    format: qcow2
    creation-time: 2024-05-01T10:00:00Z
    description: base image
tags:
  stable: aaa111
"#;

#[test]
fn test_client_new_with_valid_url() {
    let client = Client::new("http://localhost:5000/images/");
    assert!(client.is_ok());
}

#[test]
fn test_client_normalizes_url_without_scheme() {
    let client = Client::new("localhost:5000").unwrap();
    assert_eq!(client.base_url().as_str(), "http://localhost:5000/");
}

#[test]
fn test_client_appends_trailing_slash() {
    let client = Client::new("https://images.example.com/base").unwrap();
    assert_eq!(client.base_url().as_str(), "https://images.example.com/base/");
}

#[test]
fn test_client_keeps_existing_trailing_slash() {
    let client = Client::new("https://images.example.com/base/").unwrap();
    assert_eq!(client.base_url().as_str(), "https://images.example.com/base/");
}

#[test]
fn test_client_new_with_empty_url_fails() {
    let client = Client::new("   ");
    assert!(matches!(client.unwrap_err(), StrataError::Validation { .. }));
}

#[test]
fn test_resource_url_is_relative_to_repository() {
    let client = Client::new("https://images.example.com/base").unwrap();
    let url = client.resource_url(INDEX_FILE).unwrap();
    assert_eq!(url.as_str(), "https://images.example.com/base/index.yaml");
}

#[test]
fn test_client_config_default_timeout() {
    let config = ClientConfig::new();
    assert_eq!(config.timeout_seconds, 30);
}

#[test]
fn test_fetch_index_success() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/repo/index.yaml")
        .with_status(200)
        .with_header("content-type", "application/yaml")
        .with_body(INDEX_YAML)
        .create();

    let client = Client::new(&format!("{}/repo", server.url())).unwrap();
    let index = client.fetch_index().unwrap();

    mock.assert();
    assert_eq!(index.images.len(), 1);
    assert_eq!(index.images["aaa111"].actual_size, Some(1048576));
    assert_eq!(index.tags["stable"], "aaa111");
}

#[test]
fn test_fetch_index_not_found() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/index.yaml")
        .with_status(404)
        .create();

    let client = Client::new(&server.url()).unwrap();
    let result = client.fetch_index();

    mock.assert();
    let err = result.unwrap_err();
    assert!(matches!(err, StrataError::RemoteFetchFailed { .. }));
    assert!(err.to_string().contains("404"));
}

#[test]
fn test_fetch_index_server_error() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/index.yaml")
        .with_status(503)
        .with_body("maintenance")
        .create();

    let client = Client::new(&server.url()).unwrap();
    let result = client.fetch_index();

    mock.assert();
    let err = result.unwrap_err();
    assert!(err.is_retryable());
    assert!(err.to_string().contains("maintenance"));
}

#[test]
fn test_fetch_index_unparseable_body() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/index.yaml")
        .with_status(200)
        .with_body("<html>not an index</html>")
        .create();

    let client = Client::new(&server.url()).unwrap();
    let result = client.fetch_index();

    mock.assert();
    assert!(matches!(
        result.unwrap_err(),
        StrataError::RemoteFetchFailed { .. }
    ));
}

#[test]
fn test_fetch_index_unknown_version() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/index.yaml")
        .with_status(200)
        .with_body("version: 42\nimages: {}\ntags: {}\n")
        .create();

    let client = Client::new(&server.url()).unwrap();
    let result = client.fetch_index();

    mock.assert();
    match result.unwrap_err() {
        StrataError::IndexVersionMismatch { found, path, .. } => {
            assert_eq!(found, 42);
            assert!(path.unwrap().ends_with("/index.yaml"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_fetch_unreachable_server() {
    // Port 9 (discard) is almost never listening.
    let client = Client::with_config("http://127.0.0.1:9", ClientConfig::new().with_timeout(2))
        .unwrap();

    let result = client.fetch(INDEX_FILE);
    assert!(matches!(
        result.unwrap_err(),
        StrataError::RemoteFetchFailed { .. }
    ));
}
