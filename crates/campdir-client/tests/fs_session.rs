//! Sessions sharing one document file, as two CLI invocations would.

use std::sync::Arc;

use campdir_client::{ConnectionStatus, SessionHandle, SyncConfig, spawn_session};
use campdir_store::{FileCache, FsDocumentService, LocalCache, SeedSource};
use campdir_types::{Region, Tree};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const POUROSHOVA: &str = "region-satkania-pouroshova";
const WARD: &str = "ward-pouroshova-1";

async fn open(dir: &TempDir, cache_name: &str) -> (SessionHandle, FileCache) {
    let service = Arc::new(FsDocumentService::new(dir.path().join("document.json")));
    let cache = FileCache::new(dir.path().join(cache_name));
    let config = SyncConfig {
        save_debounce_ms: 50,
        ..SyncConfig::default()
    };
    let adapter = Arc::new(config.build_adapter(service, SeedSource::Embedded));
    let session = spawn_session(adapter, Arc::new(cache.clone()), config);
    session.wait_until_connected().await.unwrap();
    (session, cache)
}

fn ward_persons(tree: &Tree) -> Vec<String> {
    tree.iter()
        .filter(|r| r.id == POUROSHOVA)
        .flat_map(Region::all_wards)
        .filter(|w| w.id == WARD)
        .flat_map(|w| w.persons.iter().map(|p| p.name.clone()))
        .collect()
}

#[tokio::test]
async fn first_run_edit_survives_seed_initialisation() {
    let dir = TempDir::new().unwrap();

    let (first, first_cache) = open(&dir, "first.json").await;
    first
        .add_ward_person(POUROSHOVA, WARD, "Karim", Some("017XXXXXXXX".into()))
        .await
        .unwrap();
    first.flush().await.unwrap();
    assert_eq!(first.state().connection, ConnectionStatus::Live);
    assert_eq!(ward_persons(&first_cache.load().unwrap()), vec!["Karim"]);
    first.shutdown().await.unwrap();

    let (second, _) = open(&dir, "second.json").await;
    assert_eq!(ward_persons(&second.state().tree), vec!["Karim"]);
    second.shutdown().await.unwrap();
}

#[tokio::test]
async fn clear_all_empties_document_and_cache() {
    let dir = TempDir::new().unwrap();

    let (session, cache) = open(&dir, "cache.json").await;
    assert!(session.clear_all().await.unwrap());
    assert!(session.state().tree.is_empty());
    assert_eq!(cache.load(), None);
    session.shutdown().await.unwrap();

    let (reopened, _) = open(&dir, "other.json").await;
    assert!(reopened.state().tree.is_empty());
    reopened.shutdown().await.unwrap();
}
