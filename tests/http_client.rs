#![cfg(feature = "http")]

use menuqr_onboarding::model::{MenuSetup, RestaurantInfo};
use menuqr_onboarding::{
    ClientConfig, ErrorCode, HttpOnboardingApi, InMemoryLocalStore, LocalStore, OnboardingApi,
    OnboardingController, SessionId, Step,
};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn client(url: String, store: Arc<InMemoryLocalStore>) -> HttpOnboardingApi {
    let config = ClientConfig::default()
        .with_api_base_url(url)
        .with_request_timeout(Duration::from_secs(5));
    HttpOnboardingApi::new(&config, store).expect("client")
}

#[tokio::test]
async fn start_sends_bearer_token_and_parses_session() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/onboarding/start")
        .match_header("authorization", "Bearer owner-token")
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"sessionId":"S1","currentStep":"welcome","completedSteps":[]}"#)
        .create_async()
        .await;

    let store = Arc::new(InMemoryLocalStore::new());
    store.set("auth_token", "owner-token").expect("token");
    let api = client(server.url(), store);

    let response = api.start().await.expect("start");
    mock.assert_async().await;
    assert_eq!(response.session_id, SessionId::new("S1"));
    assert_eq!(response.current_step, Step::Welcome);
    assert!(response.completed_steps.is_empty());
}

#[tokio::test]
async fn save_flattens_sub_document_next_to_session_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/onboarding/menu-setup")
        .match_body(Matcher::Json(json!({
            "sessionId": "S1",
            "categories": ["Starters", "Mains"],
            "includeSampleItems": true
        })))
        .with_status(200)
        .with_body(r#"{"success":true}"#)
        .create_async()
        .await;

    let api = client(server.url(), Arc::new(InMemoryLocalStore::new()));
    let setup = MenuSetup {
        categories: vec!["Starters".into(), "Mains".into()],
        include_sample_items: true,
    };
    api.save_menu_setup(&SessionId::new("S1"), &setup)
        .await
        .expect("save");
    mock.assert_async().await;
}

#[tokio::test]
async fn status_not_found_is_session_expired() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/onboarding/status/S-old")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Onboarding session not found"}"#)
        .create_async()
        .await;

    let api = client(server.url(), Arc::new(InMemoryLocalStore::new()));
    let err = api
        .status(&SessionId::new("S-old"))
        .await
        .expect_err("expired");
    assert_eq!(err.code, ErrorCode::SessionExpired);
    assert_eq!(err.status, Some(404));
    assert_eq!(err.message, "Onboarding session not found");
}

#[tokio::test]
async fn unauthorized_clears_stored_credentials() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/onboarding/restaurant-info")
        .with_status(401)
        .create_async()
        .await;

    let store = Arc::new(InMemoryLocalStore::new());
    store.set("auth_token", "stale").expect("token");
    store.set("user", r#"{"id":"u1"}"#).expect("user");
    store.set("onboarding_session", "S1").expect("pointer");
    let api = client(server.url(), Arc::clone(&store));

    let info = RestaurantInfo {
        name: "Locked Out".into(),
        ..Default::default()
    };
    let err = api
        .save_restaurant_info(&SessionId::new("S1"), &info)
        .await
        .expect_err("unauthorized");
    assert_eq!(err.code, ErrorCode::Unauthorized);
    assert!(store.get("auth_token").expect("get").is_none());
    assert!(store.get("user").expect("get").is_none());
    assert_eq!(
        store.get("onboarding_session").expect("get").as_deref(),
        Some("S1")
    );
}

#[tokio::test]
async fn controller_resumes_over_http() {
    let mut server = Server::new_async().await;
    let _status = server
        .mock("GET", "/onboarding/status/S7")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "currentStep": "menu_setup",
                "completedSteps": ["welcome", "restaurant_info"],
                "restaurantInfo": { "name": "Harbor Grill", "cuisineTypes": ["seafood"] }
            })
            .to_string(),
        )
        .create_async()
        .await;
    let complete = server
        .mock("POST", "/onboarding/complete")
        .match_body(Matcher::Json(json!({ "sessionId": "S7" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"redirectTo":"/dashboard","restaurantId":"r-7"}"#)
        .create_async()
        .await;

    let store = Arc::new(InMemoryLocalStore::new());
    store.set("onboarding_session", "S7").expect("pointer");
    let config = ClientConfig::default().with_api_base_url(server.url());
    let api = HttpOnboardingApi::new(&config, Arc::clone(&store) as Arc<dyn LocalStore>)
        .expect("client");
    let controller =
        OnboardingController::new(api, Arc::clone(&store) as Arc<dyn LocalStore>, &config);

    assert!(controller.mount().await.expect("mount"));
    let state = controller.state();
    assert_eq!(state.current_step, Step::MenuSetup);
    assert_eq!(state.data.restaurant_info.name, "Harbor Grill");
    assert_eq!(state.data.restaurant_info.cuisine_types, vec!["seafood".to_string()]);
    assert!(state.data.menu_setup.include_sample_items);

    let payload = controller.complete_onboarding().await.expect("complete");
    complete.assert_async().await;
    assert_eq!(payload.restaurant_id.as_deref(), Some("r-7"));
    assert!(store.get("onboarding_session").expect("get").is_none());
}
