//! Endpoint traits.
//!
//! Slices depend on these traits, not on [`ApiClient`](crate::http::ApiClient),
//! so reducers can be exercised against [`MockApi`](crate::mocks::MockApi).

use std::future::Future;

use crate::error::ApiError;
use crate::models::{
    Ack, Anime, AnimeDetails, AnimeId, CatalogCategory, Credentials, HistoryEntry, LoginData,
    Paginated, PasswordUpdate, ProfileUpdate, Registration, ResendData, ResetPasswordData, Schedule,
    SearchFilters, SeasonData, UserProfile, VerifyEmailRequest, WatchlistItem, WatchlistUpdate,
};

/// Result of an API call
pub type ApiResult<T> = Result<T, ApiError>;

/// Catalog, season, schedule, search and detail endpoints.
pub trait AnimeApi: Send + Sync {
    /// `GET /anime/<category>?page&limit`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend rejects it.
    fn catalog(
        &self,
        category: CatalogCategory,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = ApiResult<Paginated<Anime>>> + Send;

    /// `GET /anime/season`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend rejects it.
    fn current_season(&self) -> impl Future<Output = ApiResult<SeasonData>> + Send;

    /// `GET /anime/season/<year>/<season>`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend rejects it.
    fn season(&self, year: i32, season: &str) -> impl Future<Output = ApiResult<SeasonData>> + Send;

    /// `GET /anime/schedule`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend rejects it.
    fn schedule(&self) -> impl Future<Output = ApiResult<Schedule>> + Send;

    /// `GET /anime/search?q&page&limit&<set filters>`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the backend rejects it. A page
    /// past the end answers 404.
    fn search(
        &self,
        query: &str,
        page: u32,
        limit: u32,
        filters: &SearchFilters,
    ) -> impl Future<Output = ApiResult<Paginated<Anime>>> + Send;

    /// `GET /anime/<id>`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the anime does not exist.
    fn details(&self, id: AnimeId) -> impl Future<Output = ApiResult<AnimeDetails>> + Send;
}

/// Account and session endpoints.
pub trait AuthApi: Send + Sync {
    /// `POST /auth/register`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the email is taken.
    fn register(&self, registration: &Registration) -> impl Future<Output = ApiResult<Ack>> + Send;

    /// `POST /auth/login`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the credentials are refused.
    fn login(&self, credentials: &Credentials) -> impl Future<Output = ApiResult<LoginData>> + Send;

    /// `POST /auth/verify-email`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the code is wrong or expired.
    fn verify_email(&self, request: &VerifyEmailRequest) -> impl Future<Output = ApiResult<Ack>> + Send;

    /// `POST /auth/resend-verification`
    ///
    /// `None` when the backend omits the quota payload.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the resend quota is exhausted.
    fn resend_verification(&self, email: &str) -> impl Future<Output = ApiResult<Option<ResendData>>> + Send;

    /// `POST /auth/forgot-password`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn forgot_password(&self, email: &str) -> impl Future<Output = ApiResult<Ack>> + Send;

    /// `GET /auth/reset-password/<token>/validate`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is invalid.
    fn validate_reset_token(&self, token: &str) -> impl Future<Output = ApiResult<Ack>> + Send;

    /// `PUT /auth/reset-password/<token>`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is invalid.
    fn reset_password(
        &self,
        token: &str,
        password: &str,
    ) -> impl Future<Output = ApiResult<ResetPasswordData>> + Send;

    /// `GET /auth/getme`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the session is invalid.
    fn current_user(&self) -> impl Future<Output = ApiResult<UserProfile>> + Send;

    /// `PUT /auth/update-password`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the current password is wrong.
    fn update_password(&self, update: &PasswordUpdate) -> impl Future<Output = ApiResult<Ack>> + Send;

    /// `GET /auth/logout`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn logout(&self) -> impl Future<Output = ApiResult<Ack>> + Send;
}

/// Profile, watchlist and history endpoints.
pub trait UserApi: Send + Sync {
    /// `GET /user/watchlist`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn watchlist(&self) -> impl Future<Output = ApiResult<Vec<WatchlistItem>>> + Send;

    /// `POST /user/watchlist/add`, answering the whole updated watchlist
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn add_to_watchlist(
        &self,
        item: &WatchlistItem,
    ) -> impl Future<Output = ApiResult<Vec<WatchlistItem>>> + Send;

    /// `PUT /user/watchlist/<id>/update`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the item is not on the watchlist.
    fn update_watchlist_item(
        &self,
        anime_id: AnimeId,
        update: &WatchlistUpdate,
    ) -> impl Future<Output = ApiResult<WatchlistItem>> + Send;

    /// `DELETE /user/watchlist/<id>/delete`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn remove_from_watchlist(&self, anime_id: AnimeId) -> impl Future<Output = ApiResult<Ack>> + Send;

    /// `GET /user/history`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn watch_history(&self) -> impl Future<Output = ApiResult<Vec<HistoryEntry>>> + Send;

    /// `POST /user/history/update`, answering the whole updated history
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn update_watch_history(
        &self,
        entry: &HistoryEntry,
    ) -> impl Future<Output = ApiResult<Vec<HistoryEntry>>> + Send;

    /// `PUT /user/profile/update`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn update_profile(&self, update: &ProfileUpdate) -> impl Future<Output = ApiResult<UserProfile>> + Send;

    /// `DELETE /user/profile/delete`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn delete_account(&self) -> impl Future<Output = ApiResult<Ack>> + Send;

    /// `POST /user/upgrade-premium`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn upgrade_to_premium(&self) -> impl Future<Output = ApiResult<Ack>> + Send;
}

/// Everything the app layer calls
pub trait SugoiApi: AnimeApi + AuthApi + UserApi + Clone + 'static {}

impl<T> SugoiApi for T where T: AnimeApi + AuthApi + UserApi + Clone + 'static {}
