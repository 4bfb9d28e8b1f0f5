//! HTTP adapter tests against a wiremock backend.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use serde_json::json;
use sugoi_client::models::Credentials;
use sugoi_client::{
    AnimeApi, ApiClient, ApiError, AuthApi, CatalogCategory, ClientConfig, FilterUpdate, SearchFilters,
    SessionEvent, SessionStore, UserApi,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> (ApiClient, SessionStore) {
    let session = SessionStore::in_memory();
    let client = ApiClient::new(ClientConfig::new(server.uri()), session.clone());
    (client, session)
}

#[tokio::test]
async fn attaches_bearer_token_when_present() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/anime/top"))
        .and(header("authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1, "title": "Frieren"}],
            "meta": {"page": 1, "limit": 20, "totalPages": 1, "totalResults": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, session) = client_for(&server).await;
    session.set_token("jwt-1").unwrap();

    let page = client.catalog(CatalogCategory::Top, 1, 20).await.unwrap();
    assert_eq!(page.data[0].title, "Frieren");
    assert_eq!(page.meta.unwrap().total_results, 1);
}

#[tokio::test]
async fn search_sends_only_set_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/anime/search"))
        .and(query_param("q", "naruto"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "20"))
        .and(query_param("type", "TV"))
        .and(query_param("adult", "true"))
        .and(query_param("genre", "Action,Adventure"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "meta": {"page": 2, "limit": 20, "totalPages": 5, "totalResults": 90}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let mut filters = SearchFilters::default();
    filters.apply(FilterUpdate::Kind(Some("TV".to_string())));
    filters.apply(FilterUpdate::Genre(vec!["Action".to_string(), "Adventure".to_string()]));

    let page = client.search("naruto", 2, 20, &filters).await.unwrap();
    assert_eq!(page.meta.unwrap().total_pages, 5);

    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default().to_string();
    assert!(!query.contains("score"));
    assert!(!query.contains("status"));
}

#[tokio::test]
async fn unauthorized_on_protected_endpoint_expires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/watchlist"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, session) = client_for(&server).await;
    session.set_token("stale").unwrap();
    let mut events = client.session_events();

    let error = client.watchlist().await.unwrap_err();

    assert_eq!(
        error,
        ApiError::Unauthorized {
            message: Some("Token expired".to_string())
        }
    );
    assert_eq!(session.token().unwrap(), None);
    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::Expired {
            redirect_to: "/auth/login".to_string()
        }
    );
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn unauthorized_on_login_is_a_form_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "rin@example.com", "password": "wrong"})))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Incorrect password"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Not allowed"})))
        .mount(&server)
        .await;

    let (client, session) = client_for(&server).await;
    session.set_token("kept").unwrap();
    let mut events = client.session_events();

    let error = client
        .login(&Credentials {
            email: "rin@example.com".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(error.server_message(), Some("Incorrect password"));

    let registration = sugoi_client::models::Registration {
        name: "Rin".to_string(),
        email: "rin@example.com".to_string(),
        password: "Secret123".to_string(),
    };
    assert!(client.register(&registration).await.is_err());

    assert_eq!(session.token().unwrap().as_deref(), Some("kept"));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn error_without_message_has_no_server_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/anime/schedule"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let error = client.schedule().await.unwrap_err();

    assert_eq!(error, ApiError::Status { status: 500, message: None });
    assert_eq!(error.message_or("Failed to fetch anime schedule"), "Failed to fetch anime schedule");
}

#[tokio::test]
async fn login_unwraps_nested_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"token": "jwt-2", "data": {"_id": "u1", "name": "Rin", "email": "rin@example.com"}}
        })))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    let login = client
        .login(&Credentials {
            email: "rin@example.com".to_string(),
            password: "Secret123".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(login.token, "jwt-2");
    assert_eq!(login.user.name, "Rin");
}

#[tokio::test]
async fn resend_without_payload_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/resend-verification"))
        .and(body_json(json!({"email": "rin@example.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "message": "sent"})))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server).await;
    assert_eq!(client.resend_verification("rin@example.com").await.unwrap(), None);
}
