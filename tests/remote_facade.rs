//! Remote facade behaviour against an in-memory object store.

use easy_env::codec::serde_json::json;
use easy_env::{Disk, Error, InMemoryBlobStore, Payload, Remote};
use std::sync::Arc;
use tempfile::TempDir;

fn remote() -> (Arc<InMemoryBlobStore>, Remote) {
    let store = Arc::new(InMemoryBlobStore::new());
    let remote = Remote::new("gs://test-bucket/env/", store.clone());
    (store, remote)
}

#[test]
fn image_save_is_refused_before_any_request() {
    let (store, remote) = remote();

    for path in ["plots/chart.png", "photo.JPG"] {
        let error = remote.save(&Payload::from("not an image"), path).unwrap_err();
        assert!(error.is_unsupported_format(), "{path}: {error}");
    }
    assert_eq!(store.call_count(), 0);
    assert!(store.is_empty());
}

#[test]
fn unknown_extension_is_unsupported() {
    let (store, remote) = remote();
    store.insert("test-bucket", "env/data.foobar", b"x".to_vec());

    let error = remote.load("data.foobar").unwrap_err();
    assert!(matches!(error, Error::UnsupportedFormat { .. }));
    assert!(remote
        .save(&Payload::from("x"), "data.foobar")
        .unwrap_err()
        .is_unsupported_format());
    assert_eq!(store.call_count(), 0);
}

#[test]
fn json_round_trip_uses_one_upload() {
    let (store, remote) = remote();

    remote
        .save(&Payload::from(json!({"a": 1})), "cfg/x.json")
        .unwrap();
    assert_eq!(store.call_count(), 1);

    let value: easy_env::codec::serde_json::Value = remote.load_as("cfg/x.json").unwrap();
    assert_eq!(value, json!({"a": 1}));
}

#[test]
fn failed_encode_uploads_nothing() {
    let (store, remote) = remote();

    let result = remote.save(&Payload::from("plain text"), "x.json");
    assert!(matches!(result, Err(Error::Codec(_))));
    assert!(store.is_empty());
}

#[test]
fn list_download_delete() {
    let (store, remote) = remote();
    store.insert("test-bucket", "env/a/1.txt", b"one".to_vec());
    store.insert("test-bucket", "env/a/2.txt", b"two".to_vec());
    store.insert("test-bucket", "env/b/3.txt", b"three".to_vec());
    store.insert("other-bucket", "env/a/4.txt", b"four".to_vec());

    assert_eq!(
        remote.list_files("a/").unwrap(),
        vec!["env/a/1.txt".to_string(), "env/a/2.txt".to_string()]
    );

    let dir = TempDir::new().unwrap();
    let destination = dir.path().join("nested/copy.txt");
    remote.download("a/2.txt", &destination).unwrap();
    assert_eq!(std::fs::read_to_string(&destination).unwrap(), "two");

    remote.delete("a/1.txt").unwrap();
    assert!(store.object("test-bucket", "env/a/1.txt").is_none());
    // Same as S3: deleting a missing key is not an error
    remote.delete("a/1.txt").unwrap();
    assert_eq!(store.len(), 3);
}

#[test]
fn local_and_remote_share_the_interface() {
    let (_, remote) = remote();
    let dir = TempDir::new().unwrap();
    let disk = Disk::new(dir.path());

    let payload = Payload::from("SELECT 1;\n");
    remote.save(&payload, "q.sql").unwrap();
    disk.save(&remote.load("q.sql").unwrap(), "q.sql").unwrap();

    assert_eq!(disk.load("q.sql").unwrap().as_text(), Some("SELECT 1;\n"));
}

#[test]
fn malformed_base_address() {
    let store = Arc::new(InMemoryBlobStore::new());
    let remote = Remote::new("gs://", store.clone());

    let error = remote.load("x.json").unwrap_err();
    assert!(matches!(error, Error::BackendAddressing { .. }));
    assert_eq!(store.call_count(), 0);
}
