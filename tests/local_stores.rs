use menuqr_onboarding::{
    create_local_store, FileLocalStore, LocalBackendConfig, LocalStore, OnboardingController,
};
use menuqr_onboarding::{ClientConfig, InMemoryOnboardingApi};
use std::sync::Arc;

#[test]
fn factory_returns_inmemory_store() {
    let store = create_local_store(LocalBackendConfig::InMemory).expect("in-memory store");
    store.set("onboarding_session", "S1").expect("set");
    assert_eq!(
        store.get("onboarding_session").expect("get").as_deref(),
        Some("S1")
    );
    assert!(store.delete("onboarding_session").expect("delete"));
    assert!(store.get("onboarding_session").expect("get").is_none());
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("local.json");

    let store = FileLocalStore::open(&path).expect("open");
    assert!(store.get("onboarding_session").expect("get").is_none());
    store.set("onboarding_session", "S42").expect("set");
    store.set("auth_token", "tok").expect("set token");
    drop(store);

    let reopened = FileLocalStore::open(&path).expect("reopen");
    assert_eq!(
        reopened.get("onboarding_session").expect("get").as_deref(),
        Some("S42")
    );
    assert!(reopened.delete("onboarding_session").expect("delete"));
    assert!(!reopened.delete("onboarding_session").expect("delete again"));
    drop(reopened);

    let again = FileLocalStore::open(&path).expect("reopen again");
    assert!(again.get("onboarding_session").expect("get").is_none());
    assert_eq!(again.get("auth_token").expect("get").as_deref(), Some("tok"));
}

#[test]
fn file_store_rejects_corrupt_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("local.json");
    std::fs::write(&path, "{not json").expect("write");

    let err = FileLocalStore::open(&path)
        .err()
        .expect("corrupt file rejected");
    assert_eq!(err.code, menuqr_onboarding::ErrorCode::Internal);
}

#[tokio::test]
async fn session_resumes_from_file_after_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("local.json");
    let api = Arc::new(InMemoryOnboardingApi::new());
    let config = ClientConfig::default().with_local_backend(LocalBackendConfig::File(path.clone()));

    let store = create_local_store(config.local_backend.clone()).expect("file store");
    let controller = OnboardingController::new(Arc::clone(&api), store, &config);
    let session = controller
        .start_onboarding()
        .await
        .expect("start")
        .session_id
        .expect("session");
    drop(controller);

    let store = create_local_store(config.local_backend.clone()).expect("file store again");
    let restarted = OnboardingController::new(Arc::clone(&api), store, &config);
    assert!(restarted.mount().await.expect("mount"));
    assert_eq!(restarted.session_id(), Some(session));
}

#[cfg(feature = "redis")]
mod redis_cases {
    use super::*;
    use menuqr_onboarding::redis_store::RedisLocalStore;
    use menuqr_onboarding::SessionId;

    fn redis_store() -> Option<RedisLocalStore> {
        let url = std::env::var("REDIS_URL").ok()?;
        let namespace = format!("menuqr:onboarding:test:{}", SessionId::generate());
        RedisLocalStore::from_url_with_namespace(url, namespace).ok()
    }

    #[test]
    fn redis_set_get_delete() {
        let Some(store) = redis_store() else {
            eprintln!("Skipping redis_set_get_delete - REDIS_URL not set or invalid");
            return;
        };

        store.set("onboarding_session", "S-redis").expect("set redis");
        assert_eq!(
            store.get("onboarding_session").expect("get redis").as_deref(),
            Some("S-redis")
        );
        assert!(store.delete("onboarding_session").expect("delete redis"));
        assert!(store.get("onboarding_session").expect("get redis").is_none());
    }
}
