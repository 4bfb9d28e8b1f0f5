//! reqwest-backed HTTP adapter
//!
//! Attaches the bearer token from the [`SessionStore`] to every request and
//! intercepts 401 answers: outside the login and registration endpoints a
//! 401 purges the token and broadcasts [`SessionEvent::Expired`].

use std::future::Future;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::api::{AnimeApi, ApiResult, AuthApi, UserApi};
use crate::config::{ClientConfig, SESSION_EXEMPT_PATHS};
use crate::error::ApiError;
use crate::models::{
    Ack, Anime, AnimeDetails, AnimeId, CatalogCategory, Credentials, Envelope, HistoryEntry,
    LoginData, OptionalEnvelope, Paginated, PasswordUpdate, ProfileUpdate, Registration, ResendData,
    ResetPasswordData, Schedule, SearchFilters, SeasonData, UserProfile, VerifyEmailRequest,
    WatchlistItem, WatchlistUpdate,
};
use crate::session::SessionStore;

const SESSION_EVENT_CAPACITY: usize = 16;

/// Session lifecycle notifications raised by the adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A protected request answered 401; the token has been purged
    Expired {
        /// Route the client should navigate to
        redirect_to: String,
    },
}

/// Whether a 401 from `path` is a credential failure rather than session expiry
#[must_use]
pub fn is_session_exempt(path: &str) -> bool {
    SESSION_EXEMPT_PATHS.iter().any(|exempt| path.starts_with(exempt))
}

/// One request on its way through the interceptor
#[derive(Debug)]
struct InFlight<'a> {
    path: &'a str,
    retried: bool,
}

impl<'a> InFlight<'a> {
    const fn new(path: &'a str) -> Self {
        Self { path, retried: false }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Sugoi API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
    session: SessionStore,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    /// Create a client over `session`
    #[must_use]
    pub fn new(config: ClientConfig, session: SessionStore) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            client: Client::new(),
            config,
            session,
            events,
        }
    }

    /// Create a client with its base URL from `SUGOI_API_URL`
    #[must_use]
    pub fn from_env(session: SessionStore) -> Self {
        Self::new(ClientConfig::from_env(), session)
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Session store the token is read from
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Subscribe to session expiry notifications
    #[must_use]
    pub fn session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.config.url(path));
        match self.session.token() {
            Ok(Some(token)) => builder.bearer_auth(token),
            Ok(None) => builder,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read session token, sending unauthenticated");
                builder
            },
        }
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> ApiResult<T> {
        let mut in_flight = InFlight::new(path);

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        tracing::debug!(path, status = status.as_u16(), "API response");

        if status.is_success() {
            let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
            return serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()));
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);

        match status {
            StatusCode::UNAUTHORIZED => {
                self.intercept_unauthorized(&mut in_flight);
                Err(ApiError::Unauthorized { message })
            },
            status => Err(ApiError::Status {
                status: status.as_u16(),
                message,
            }),
        }
    }

    fn intercept_unauthorized(&self, in_flight: &mut InFlight<'_>) {
        if is_session_exempt(in_flight.path) || in_flight.retried {
            return;
        }
        in_flight.retried = true;

        if let Err(e) = self.session.clear_token() {
            tracing::warn!(error = %e, "Failed to purge session token");
        }
        tracing::warn!(path = in_flight.path, "Session expired, redirecting to login");

        // No subscribers is fine
        let _ = self.events.send(SessionEvent::Expired {
            redirect_to: self.config.login_route.clone(),
        });
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ApiResult<T> {
        self.send(path, self.request(Method::GET, path).query(query)).await
    }

    async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        self.send(path, self.request(Method::POST, path).json(body)).await
    }

    async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        self.send(path, self.request(Method::PUT, path).json(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(path, self.request(Method::DELETE, path)).await
    }
}

fn page_query(page: u32, limit: u32) -> [(&'static str, String); 2] {
    [("page", page.to_string()), ("limit", limit.to_string())]
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct PasswordBody<'a> {
    password: &'a str,
}

impl AnimeApi for ApiClient {
    fn catalog(
        &self,
        category: CatalogCategory,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = ApiResult<Paginated<Anime>>> + Send {
        async move {
            let path = format!("/anime/{}", category.path());
            self.get(&path, &page_query(page, limit)).await
        }
    }

    fn current_season(&self) -> impl Future<Output = ApiResult<SeasonData>> + Send {
        async move {
            let envelope: Envelope<SeasonData> = self.get("/anime/season", &[]).await?;
            Ok(envelope.data)
        }
    }

    fn season(&self, year: i32, season: &str) -> impl Future<Output = ApiResult<SeasonData>> + Send {
        let path = format!("/anime/season/{year}/{season}");
        async move {
            let envelope: Envelope<SeasonData> = self.get(&path, &[]).await?;
            Ok(envelope.data)
        }
    }

    fn schedule(&self) -> impl Future<Output = ApiResult<Schedule>> + Send {
        async move {
            let envelope: Envelope<Schedule> = self.get("/anime/schedule", &[]).await?;
            Ok(envelope.data)
        }
    }

    fn search(
        &self,
        query: &str,
        page: u32,
        limit: u32,
        filters: &SearchFilters,
    ) -> impl Future<Output = ApiResult<Paginated<Anime>>> + Send {
        let mut params = vec![("q", query.to_string())];
        params.extend(page_query(page, limit));
        params.extend(filters.to_query());
        async move { self.get("/anime/search", &params).await }
    }

    fn details(&self, id: AnimeId) -> impl Future<Output = ApiResult<AnimeDetails>> + Send {
        async move {
            let envelope: Envelope<AnimeDetails> = self.get(&format!("/anime/{id}"), &[]).await?;
            Ok(envelope.data)
        }
    }
}

impl AuthApi for ApiClient {
    fn register(&self, registration: &Registration) -> impl Future<Output = ApiResult<Ack>> + Send {
        async move { self.post("/auth/register", registration).await }
    }

    fn login(&self, credentials: &Credentials) -> impl Future<Output = ApiResult<LoginData>> + Send {
        async move {
            let envelope: Envelope<LoginData> = self.post("/auth/login", credentials).await?;
            Ok(envelope.data)
        }
    }

    fn verify_email(&self, request: &VerifyEmailRequest) -> impl Future<Output = ApiResult<Ack>> + Send {
        async move { self.post("/auth/verify-email", request).await }
    }

    fn resend_verification(&self, email: &str) -> impl Future<Output = ApiResult<Option<ResendData>>> + Send {
        async move {
            let envelope: OptionalEnvelope<ResendData> =
                self.post("/auth/resend-verification", &EmailBody { email }).await?;
            Ok(envelope.data)
        }
    }

    fn forgot_password(&self, email: &str) -> impl Future<Output = ApiResult<Ack>> + Send {
        async move { self.post("/auth/forgot-password", &EmailBody { email }).await }
    }

    fn validate_reset_token(&self, token: &str) -> impl Future<Output = ApiResult<Ack>> + Send {
        let path = format!("/auth/reset-password/{token}/validate");
        async move { self.get(&path, &[]).await }
    }

    fn reset_password(
        &self,
        token: &str,
        password: &str,
    ) -> impl Future<Output = ApiResult<ResetPasswordData>> + Send {
        let path = format!("/auth/reset-password/{token}");
        async move {
            let envelope: OptionalEnvelope<ResetPasswordData> =
                self.put(&path, &PasswordBody { password }).await?;
            Ok(envelope.data.unwrap_or_default())
        }
    }

    fn current_user(&self) -> impl Future<Output = ApiResult<UserProfile>> + Send {
        async move {
            let envelope: Envelope<UserProfile> = self.get("/auth/getme", &[]).await?;
            Ok(envelope.data)
        }
    }

    fn update_password(&self, update: &PasswordUpdate) -> impl Future<Output = ApiResult<Ack>> + Send {
        async move { self.put("/auth/update-password", update).await }
    }

    fn logout(&self) -> impl Future<Output = ApiResult<Ack>> + Send {
        async move { self.get("/auth/logout", &[]).await }
    }
}

impl UserApi for ApiClient {
    fn watchlist(&self) -> impl Future<Output = ApiResult<Vec<WatchlistItem>>> + Send {
        async move {
            let envelope: Envelope<Vec<WatchlistItem>> = self.get("/user/watchlist", &[]).await?;
            Ok(envelope.data)
        }
    }

    fn add_to_watchlist(
        &self,
        item: &WatchlistItem,
    ) -> impl Future<Output = ApiResult<Vec<WatchlistItem>>> + Send {
        async move {
            let envelope: Envelope<Vec<WatchlistItem>> = self.post("/user/watchlist/add", item).await?;
            Ok(envelope.data)
        }
    }

    fn update_watchlist_item(
        &self,
        anime_id: AnimeId,
        update: &WatchlistUpdate,
    ) -> impl Future<Output = ApiResult<WatchlistItem>> + Send {
        let path = format!("/user/watchlist/{anime_id}/update");
        async move {
            let envelope: Envelope<WatchlistItem> = self.put(&path, update).await?;
            Ok(envelope.data)
        }
    }

    fn remove_from_watchlist(&self, anime_id: AnimeId) -> impl Future<Output = ApiResult<Ack>> + Send {
        let path = format!("/user/watchlist/{anime_id}/delete");
        async move { self.delete(&path).await }
    }

    fn watch_history(&self) -> impl Future<Output = ApiResult<Vec<HistoryEntry>>> + Send {
        async move {
            let envelope: Envelope<Vec<HistoryEntry>> = self.get("/user/history", &[]).await?;
            Ok(envelope.data)
        }
    }

    fn update_watch_history(
        &self,
        entry: &HistoryEntry,
    ) -> impl Future<Output = ApiResult<Vec<HistoryEntry>>> + Send {
        async move {
            let envelope: Envelope<Vec<HistoryEntry>> = self.post("/user/history/update", entry).await?;
            Ok(envelope.data)
        }
    }

    fn update_profile(&self, update: &ProfileUpdate) -> impl Future<Output = ApiResult<UserProfile>> + Send {
        async move {
            let envelope: Envelope<UserProfile> = self.put("/user/profile/update", update).await?;
            Ok(envelope.data)
        }
    }

    fn delete_account(&self) -> impl Future<Output = ApiResult<Ack>> + Send {
        async move { self.delete("/user/profile/delete").await }
    }

    fn upgrade_to_premium(&self) -> impl Future<Output = ApiResult<Ack>> + Send {
        async move {
            self.send("/user/upgrade-premium", self.request(Method::POST, "/user/upgrade-premium"))
                .await
        }
    }
}
