//! RemoteAdapter over a shared JSON document file.

use std::sync::Arc;
use std::time::Duration;

use campdir_store::{FsDocumentService, RemoteAdapter, SeedSource, SubscriptionEvent};
use campdir_types::{Person, Region, Tree, Ward};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn tree(person: &str) -> Tree {
    vec![Region::with_wards(
        "region-satkania-pouroshova",
        "Satkania Pouroshova",
        vec![Ward {
            id: "ward-pouroshova-1".into(),
            name: "Ward-1".into(),
            persons: vec![Person {
                id: format!("person-{person}"),
                name: person.into(),
                phone: Some("01700000000".into()),
            }],
        }],
    )]
}

fn adapter(dir: &TempDir) -> RemoteAdapter {
    let service = Arc::new(FsDocumentService::new(dir.path().join("regions-data.json")));
    RemoteAdapter::new(service, SeedSource::Embedded)
}

#[tokio::test]
async fn write_then_read_through_file() {
    let dir = TempDir::new().unwrap();
    let writer = adapter(&dir);
    let reader = adapter(&dir);

    assert!(writer.write(&tree("Karim")).await);
    assert_eq!(reader.try_read().await.unwrap(), Some(tree("Karim")));
}

#[tokio::test]
async fn missing_file_reads_as_embedded_seed() {
    let dir = TempDir::new().unwrap();
    let seed = SeedSource::Embedded.load().await;
    assert_eq!(adapter(&dir).read().await, seed);
}

#[tokio::test]
async fn subscriber_sees_other_writer() {
    let dir = TempDir::new().unwrap();
    let writer = adapter(&dir);
    let watcher = adapter(&dir);

    assert!(writer.write(&tree("Karim")).await);
    let mut sub = watcher.subscribe();
    assert_eq!(sub.recv().await, Some(SubscriptionEvent::Changed(tree("Karim"))));

    assert!(writer.write(&tree("Salma")).await);
    let seen = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match sub.recv().await {
                Some(SubscriptionEvent::Changed(t)) if t == tree("Salma") => return true,
                Some(_) => continue,
                None => return false,
            }
        }
    })
    .await;
    assert!(matches!(seen, Ok(true)), "subscriber never saw the second write");
}
