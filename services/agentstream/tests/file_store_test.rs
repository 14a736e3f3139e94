use agentstream_core::{AuthManager, FeedPreference, KeyValueStore, Storage};
use agentstream_lib::adapters::JsonFileStore;
use std::sync::Arc;

fn open_storage(path: &std::path::Path) -> Storage {
    Storage::new(Arc::new(JsonFileStore::open(path).unwrap()))
}

#[test]
fn values_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let store = JsonFileStore::open(&path).unwrap();
    store.set("greeting", "hello".to_string()).unwrap();
    store.set("doomed", "bye".to_string()).unwrap();
    store.remove("doomed").unwrap();
    drop(store);

    let reopened = JsonFileStore::open(&path).unwrap();
    assert_eq!(reopened.get("greeting").unwrap(), Some("hello".to_string()));
    assert_eq!(reopened.get("doomed").unwrap(), None);
    assert!(!dir.path().join("store.json.tmp").exists());
}

#[test]
fn login_and_profile_data_persist_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agentstream_store.json");

    let profile_id = {
        let storage = open_storage(&path);
        let mut auth = AuthManager::new(storage.clone());
        let profile = auth.login_with_credential("AIza-test").unwrap();
        storage.set_feed_preference(&profile.id, FeedPreference::Personalized);
        profile.id
    };

    let storage = open_storage(&path);
    let mut auth = AuthManager::new(storage.clone());
    let status = auth.initialize();

    assert!(status.is_authenticated);
    assert!(status.has_profile);
    assert_eq!(auth.api_key(), Some("AIza-test"));
    assert_eq!(auth.current_profile().map(|p| p.id.as_str()), Some(profile_id.as_str()));
    assert_eq!(
        storage.feed_preference(&profile_id),
        FeedPreference::Personalized
    );
}

#[test]
fn file_is_plain_json_keyed_by_storage_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let storage = open_storage(&path);
    storage.set_api_key("AIza-test");

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["agentstream_api_key"], "\"AIza-test\"");
}
