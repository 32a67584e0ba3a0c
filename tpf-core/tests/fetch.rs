//! Tests for datasource resource fetching

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tpf_core::{Datasource, DatasourceOptions, Error, MemoryBackend};

fn datasource() -> Datasource {
    Datasource::new(
        DatasourceOptions::with_path("fetch"),
        Arc::new(MemoryBackend::default()),
    )
}

fn example_file(contents: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn fetches_an_existing_file() {
    let file = example_file(b"<a> <b> <c>.\n");
    let ds = datasource();

    let url = format!("file://{}", file.path().display());
    let bytes = ds.fetch(&url).collect().await.unwrap();
    assert_eq!(bytes, b"<a> <b> <c>.\n");
}

#[tokio::test]
async fn assumes_the_file_protocol_by_default() {
    let file = example_file(b"default protocol");
    let ds = datasource();

    let bytes = ds
        .fetch(&file.path().display().to_string())
        .collect()
        .await
        .unwrap();
    assert_eq!(bytes, b"default protocol");
}

#[tokio::test]
async fn reports_an_unknown_protocol_on_the_stream() {
    let ds = datasource();
    let mut stream = ds.fetch("myprotocol:abc");
    match stream.next().await {
        Some(Err(Error::UnknownProtocol(scheme))) => assert_eq!(scheme, "myprotocol"),
        other => panic!("expected unknown protocol error, got {other:?}"),
    }
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn missing_file_errors_on_the_stream_when_observed() {
    let ds = datasource();
    let mut errors = ds.errors().unwrap();

    let mut stream = ds.fetch("/definitely/not/here.ttl");
    assert!(matches!(stream.next().await, Some(Err(Error::Io(_)))));

    // an observed error is not duplicated at the datasource level
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(errors.try_recv().is_err());
}

#[tokio::test]
async fn unobserved_error_promotes_to_the_datasource_level() {
    let ds = datasource();
    let mut errors = ds.errors().unwrap();

    let stream = ds.fetch("/definitely/not/here.ttl");
    drop(stream);

    match errors.recv().await {
        Some(Error::Io(msg)) => assert!(!msg.is_empty()),
        other => panic!("expected promoted I/O error, got {other:?}"),
    }
}
