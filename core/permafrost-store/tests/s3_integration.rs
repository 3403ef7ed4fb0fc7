//! Integration tests for S3Endpoint against real MinIO.
//!
//! Requires a local MinIO with a `permafrost-test` bucket:
//! `docker run -p 9000:9000 minio/minio server /data`
//! Run with `cargo test -- --ignored`.

use std::io::Cursor;

use permafrost_store::{ByteStreamReader, ConnectOptions, Endpoint, S3Endpoint, Secrets};
use tokio::io::AsyncReadExt;

fn minio_secrets() -> Secrets {
    Secrets {
        access_key_id: Some("minioadmin".to_string()),
        secret_access_key: Some("minioadmin".to_string()),
        region: Some("us-east-1".to_string()),
        endpoint: Some("http://localhost:9000".to_string()),
        ..Secrets::default()
    }
}

fn test_endpoint(prefix: &str) -> S3Endpoint {
    // MinIO has no cold tiers; STANDARD keeps the writes accepted.
    let opts = ConnectOptions {
        storage_class: Some("STANDARD".to_string()),
        ..ConnectOptions::default()
    };
    S3Endpoint::new(
        "permafrost-test".to_string(),
        prefix.to_string(),
        &minio_secrets(),
        &opts,
    )
    .unwrap()
}

fn reader(data: &[u8]) -> ByteStreamReader {
    Box::pin(Cursor::new(data.to_vec()))
}

#[tokio::test]
#[ignore = "requires a local MinIO"]
async fn upload_list_download_remove_roundtrip() {
    let s3 = test_endpoint("it/roundtrip");

    s3.write("dir/hello.bin", reader(b"hello object store"), 18)
        .await
        .unwrap();

    let entries = s3.list().await.unwrap();
    assert!(entries.iter().any(|e| e.path == "dir/hello.bin" && e.size == 18));
    assert_eq!(s3.size("dir/hello.bin").await.unwrap(), 18);

    let mut out = Vec::new();
    s3.read("dir/hello.bin")
        .await
        .unwrap()
        .read_to_end(&mut out)
        .await
        .unwrap();
    assert_eq!(out, b"hello object store");

    s3.remove("dir/hello.bin").await.unwrap();
    assert!(s3.list().await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires a local MinIO"]
async fn empty_object_uploads_as_one_empty_part() {
    let s3 = test_endpoint("it/empty");
    s3.write("zero.bin", reader(b""), 0).await.unwrap();
    assert_eq!(s3.size("zero.bin").await.unwrap(), 0);
    s3.remove("zero.bin").await.unwrap();
}

#[tokio::test]
#[ignore = "requires a local MinIO"]
async fn listing_follows_continuation_tokens() {
    let s3 = test_endpoint("it/pagination");

    // More than one ListObjectsV2 page (page size 1000).
    for i in 0..1100 {
        s3.write(&format!("bulk/file-{i:04}.txt"), reader(b"x"), 1)
            .await
            .unwrap();
    }

    let entries = s3.list().await.unwrap();
    assert_eq!(entries.len(), 1100);

    for i in 0..1100 {
        s3.remove(&format!("bulk/file-{i:04}.txt")).await.unwrap();
    }
}

#[tokio::test]
#[ignore = "requires a local MinIO"]
async fn head_reports_storage_class() {
    let s3 = test_endpoint("it/head");
    s3.write("meta.bin", reader(b"m"), 1).await.unwrap();

    let meta = s3.head("meta.bin").await.unwrap();
    assert!(!meta.is_archived());
    assert!(!meta.restore_in_progress());

    s3.remove("meta.bin").await.unwrap();
}
