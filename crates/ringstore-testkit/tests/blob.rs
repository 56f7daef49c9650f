//! Paged blobs over a replicated cluster.

use bytes::Bytes;
use ringstore::{BlobError, ConsistencyLevel, Outcome, Storage};
use ringstore_testkit::{init_tracing, TestCluster};

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_write_and_read_across_pages() {
    init_tracing();
    let cluster = TestCluster::start(3).await.unwrap();
    let node = cluster.node(0);

    let blob = node
        .create_blob("disk", 2000, ConsistencyLevel::Quorum)
        .await
        .unwrap();
    assert_eq!(blob.size(), 2000);
    assert_eq!(blob.page_size(), 512);
    assert_eq!(blob.page_count(), 4);

    let data = pattern(2000);
    blob.write_at(&data, 0).await.unwrap();

    let mut back = vec![0u8; 2000];
    blob.read_at(&mut back, 0).await.unwrap();
    assert_eq!(back, data);

    // Another node sees the same contents.
    let other = cluster
        .node(2)
        .open_blob("disk", ConsistencyLevel::Quorum)
        .await
        .unwrap();
    assert_eq!(other.size(), 2000);
    let mut middle = vec![0u8; 100];
    other.read_at(&mut middle, 480).await.unwrap();
    assert_eq!(&middle[..], &data[480..580]);

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_page_keys() {
    init_tracing();
    let cluster = TestCluster::start(1).await.unwrap();

    let blob = cluster
        .node(0)
        .create_blob("disk", 2000, ConsistencyLevel::One)
        .await
        .unwrap();
    assert_eq!(blob.page_key(0), Bytes::from_static(b"disk.00000000"));
    assert_eq!(blob.page_key(511), Bytes::from_static(b"disk.00000000"));
    assert_eq!(blob.page_key(512), Bytes::from_static(b"disk.00000001"));
    assert_eq!(blob.page_key(1999), Bytes::from_static(b"disk.00000003"));

    blob.write_byte_at(1000, 0xAB).await.unwrap();
    let holders = cluster.holders(b"disk.00000001").await.unwrap();
    assert_eq!(holders, vec![0]);
    assert!(cluster.holders(b"disk.00000000").await.unwrap().is_empty());

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_unwritten_bytes_read_as_zero() {
    init_tracing();
    let cluster = TestCluster::start(2).await.unwrap();

    let blob = cluster
        .node(0)
        .create_blob("sparse", 1500, ConsistencyLevel::All)
        .await
        .unwrap();
    assert_eq!(blob.read_byte_at(700).await.unwrap(), 0);

    blob.write_byte_at(10, 42).await.unwrap();
    let mut buf = vec![0xFFu8; 20];
    blob.read_at(&mut buf, 0).await.unwrap();
    let mut expected = vec![0u8; 20];
    expected[10] = 42;
    assert_eq!(buf, expected);

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_partial_page_write_keeps_neighbours() {
    init_tracing();
    let cluster = TestCluster::start(2).await.unwrap();

    let blob = cluster
        .node(1)
        .create_blob("patch", 1024, ConsistencyLevel::All)
        .await
        .unwrap();
    blob.write_at(&vec![1u8; 1024], 0).await.unwrap();
    blob.write_at(&[9u8; 8], 508).await.unwrap();

    let mut buf = vec![0u8; 16];
    blob.read_at(&mut buf, 504).await.unwrap();
    assert_eq!(buf, [1, 1, 1, 1, 9, 9, 9, 9, 9, 9, 9, 9, 1, 1, 1, 1]);

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_out_of_range() {
    init_tracing();
    let cluster = TestCluster::start(1).await.unwrap();

    let blob = cluster
        .node(0)
        .create_blob("small", 100, ConsistencyLevel::One)
        .await
        .unwrap();

    assert!(matches!(
        blob.read_byte_at(100).await,
        Err(BlobError::OutOfRange { offset: 100, size: 100, .. })
    ));
    assert!(matches!(
        blob.write_at(&[0u8; 10], 95).await,
        Err(BlobError::OutOfRange { .. })
    ));
    let mut buf = [0u8; 5];
    assert!(blob.read_at(&mut buf, 95).await.is_ok());

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_open_missing_blob() {
    init_tracing();
    let cluster = TestCluster::start(2).await.unwrap();

    let result = cluster
        .node(0)
        .open_blob("never-created", ConsistencyLevel::All)
        .await;
    assert!(matches!(
        result,
        Err(BlobError::OpenFailed(Outcome::Failure))
    ));

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_page_is_an_error() {
    init_tracing();
    let cluster = TestCluster::start(2).await.unwrap();

    let blob = cluster
        .node(0)
        .create_blob("remote", 100, ConsistencyLevel::Zero)
        .await
        .unwrap();
    blob.write_byte_at(5, 7).await.unwrap();

    let holders = cluster.holders(&blob.page_key(5)).await.unwrap();
    assert_eq!(holders.len(), 1);
    let holder = holders[0];
    let reader = 1 - holder;

    let remote = cluster
        .node(reader)
        .open_blob("remote", ConsistencyLevel::Zero)
        .await
        .unwrap();
    assert_eq!(remote.read_byte_at(5).await.unwrap(), 7);

    assert!(cluster.isolate(holder).await);

    assert!(matches!(
        remote.read_byte_at(5).await,
        Err(BlobError::PageLoad {
            page: 0,
            outcome: Outcome::Failure
        })
    ));
    // A write must not replace the unreachable page with zeros.
    assert!(matches!(
        remote.write_byte_at(6, 1).await,
        Err(BlobError::PageLoad { .. })
    ));
    let stored = cluster
        .node(holder)
        .storage()
        .get(&blob.page_key(5))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored[5], 7);
    assert_eq!(stored[6], 0);

    cluster.shutdown().await;
}
