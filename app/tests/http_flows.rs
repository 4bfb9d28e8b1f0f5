//! Store flows over the real HTTP adapter against a wiremock backend.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use sugoi_app::slices::auth::{AuthAction, INCORRECT_PASSWORD};
use sugoi_app::slices::search::SearchAction;
use sugoi_app::slices::watchlist::WatchlistAction;
use sugoi_app::validation::{Field, LoginForm};
use sugoi_app::{app_store, forward_session_events, AppAction, AppEnvironment, AppStore};
use sugoi_client::{ApiClient, ClientConfig, SessionEvent, SessionStore};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn store_for(server: &MockServer) -> (Arc<AppStore<ApiClient>>, ApiClient, SessionStore) {
    let session = SessionStore::in_memory();
    let client = ApiClient::new(ClientConfig::new(server.uri()), session.clone());
    let store = Arc::new(app_store(AppEnvironment::new(client.clone(), session.clone())));
    (store, client, session)
}

async fn send(store: &AppStore<ApiClient>, action: AppAction) {
    let mut handle = store.send(action).await.unwrap();
    handle.wait().await;
}

fn page(ids: std::ops::RangeInclusive<u64>, page: u32, total_pages: u32) -> Value {
    let data: Vec<Value> = ids.map(|id| json!({"id": id, "title": format!("Bleach {id}")})).collect();
    json!({
        "data": data,
        "meta": {"page": page, "limit": 20, "totalPages": total_pages, "totalResults": total_pages * 20}
    })
}

#[tokio::test]
async fn not_found_on_load_more_ends_the_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/anime/search"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(1..=20, 1, 3)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/anime/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "No results found"})))
        .expect(1)
        .mount(&server)
        .await;

    let (store, _, _) = store_for(&server).await;
    send(&store, AppAction::Search(SearchAction::search("bleach"))).await;
    send(&store, AppAction::Search(SearchAction::LoadMore)).await;
    send(&store, AppAction::Search(SearchAction::LoadMore)).await;

    let (len, error, page, total) = store
        .state(|s| {
            (
                s.search.results.data.len(),
                s.search.results.error.clone(),
                s.search.pagination.page,
                s.search.pagination.total_pages,
            )
        })
        .await;
    assert_eq!(len, 20);
    assert_eq!(error, None);
    assert_eq!(page, total);
}

#[tokio::test]
async fn expired_session_reaches_auth_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/watchlist"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Not authorized, token failed"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (store, client, session) = store_for(&server).await;
    session.set_token("expired-jwt").unwrap();
    let mut observer = client.session_events();
    forward_session_events(Arc::clone(&store), client.session_events());

    send(&store, AppAction::Watchlist(WatchlistAction::Fetch)).await;

    let redirect = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Some(route) = store.state(|s| s.auth.redirect_to.clone()).await {
                return route;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("session expiry never reached the auth slice");

    assert_eq!(redirect, "/auth/login");
    assert_eq!(session.token().unwrap(), None);
    assert_eq!(
        store.state(|s| s.watchlist.watchlist.error.clone()).await.as_deref(),
        Some("Not authorized, token failed")
    );
    assert_eq!(
        observer.try_recv().unwrap(),
        SessionEvent::Expired {
            redirect_to: "/auth/login".to_string()
        }
    );
    assert!(observer.try_recv().is_err());
}

#[tokio::test]
async fn rejected_login_is_a_field_error_not_an_expiry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Incorrect password"})))
        .expect(1)
        .mount(&server)
        .await;

    let (store, client, session) = store_for(&server).await;
    session.set_token("previous-jwt").unwrap();
    let mut observer = client.session_events();

    send(
        &store,
        AppAction::Auth(AuthAction::Login(LoginForm {
            email: "ichigo@example.com".to_string(),
            password: "Zangetsu1".to_string(),
        })),
    )
    .await;

    let (field_error, redirect) = store
        .state(|s| {
            (
                s.auth.field_errors.get(&Field::Password).cloned(),
                s.auth.redirect_to.clone(),
            )
        })
        .await;
    assert_eq!(field_error.as_deref(), Some(INCORRECT_PASSWORD));
    assert_eq!(redirect, None);
    assert_eq!(session.token().unwrap().as_deref(), Some("previous-jwt"));
    assert!(observer.try_recv().is_err());
}
