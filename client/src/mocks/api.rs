//! In-memory backend implementing every endpoint trait.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::{AnimeApi, ApiResult, AuthApi, UserApi};
use crate::error::ApiError;
use crate::models::{
    Ack, Anime, AnimeDetails, AnimeId, CatalogCategory, Credentials, HistoryEntry, LoginData,
    PageMeta, Paginated, PasswordUpdate, ProfileUpdate, Registration, ResendData, ResetPasswordData,
    Schedule, SearchFilters, SeasonData, UserProfile, VerifyEmailRequest, WatchlistItem,
    WatchlistUpdate,
};

/// Code issued to every registration unless overridden.
pub const DEFAULT_OTP: &str = "123456";

#[derive(Debug, Clone)]
struct Account {
    profile: UserProfile,
    password: String,
    verified: bool,
}

#[derive(Debug, Default)]
struct Backend {
    catalogs: BTreeMap<CatalogCategory, Vec<Anime>>,
    search: HashMap<String, Vec<Anime>>,
    current_season: SeasonData,
    seasons: HashMap<(i32, String), SeasonData>,
    schedule: Schedule,
    details: HashMap<AnimeId, AnimeDetails>,
    accounts: HashMap<String, Account>,
    otp: String,
    resend_attempts: u32,
    resend_cooldown_secs: u64,
    resend_payload: bool,
    reset_tokens: HashSet<String>,
    signed_in: Option<String>,
    watchlist: Vec<WatchlistItem>,
    history: Vec<HistoryEntry>,
    failures: HashMap<&'static str, VecDeque<ApiError>>,
    calls: Vec<String>,
}

/// Mock API backend
///
/// Clones share the same backend, so a test can keep one handle to script
/// and inspect while the environment owns another.
#[derive(Debug, Clone)]
pub struct MockApi {
    backend: Arc<Mutex<Backend>>,
}

impl MockApi {
    /// Create an empty backend. Resends allow 3 attempts with a 60 s cooldown.
    #[must_use]
    pub fn new() -> Self {
        Self {
            backend: Arc::new(Mutex::new(Backend {
                otp: DEFAULT_OTP.to_string(),
                resend_attempts: 3,
                resend_cooldown_secs: 60,
                resend_payload: true,
                ..Backend::default()
            })),
        }
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, Backend>> {
        self.backend
            .lock()
            .map_err(|_| ApiError::Network("mock backend lock poisoned".to_string()))
    }

    fn with_backend(self, f: impl FnOnce(&mut Backend)) -> Self {
        if let Ok(mut backend) = self.backend.lock() {
            f(&mut backend);
        }
        self
    }

    /// Serve `items` for a catalog
    #[must_use]
    pub fn with_catalog(self, category: CatalogCategory, items: Vec<Anime>) -> Self {
        self.with_backend(|b| {
            b.catalogs.insert(category, items);
        })
    }

    /// Serve `items` for a search query
    #[must_use]
    pub fn with_search_results(self, query: &str, items: Vec<Anime>) -> Self {
        self.with_backend(|b| {
            b.search.insert(query.to_string(), items);
        })
    }

    /// Serve the current season
    #[must_use]
    pub fn with_current_season(self, data: SeasonData) -> Self {
        self.with_backend(|b| b.current_season = data)
    }

    /// Serve a past or future season
    #[must_use]
    pub fn with_season(self, year: i32, season: &str, data: SeasonData) -> Self {
        self.with_backend(|b| {
            b.seasons.insert((year, season.to_string()), data);
        })
    }

    /// Serve the weekly schedule
    #[must_use]
    pub fn with_schedule(self, schedule: Schedule) -> Self {
        self.with_backend(|b| b.schedule = schedule)
    }

    /// Serve details for one anime
    #[must_use]
    pub fn with_details(self, details: AnimeDetails) -> Self {
        self.with_backend(|b| {
            b.details.insert(details.anime.id, details);
        })
    }

    /// Register an account directly
    #[must_use]
    pub fn with_account(self, name: &str, email: &str, password: &str, verified: bool) -> Self {
        self.with_backend(|b| {
            b.accounts.insert(
                email.to_string(),
                Account {
                    profile: UserProfile::new(name, email),
                    password: password.to_string(),
                    verified,
                },
            );
        })
    }

    /// Code accepted by `verify_email`
    #[must_use]
    pub fn with_otp(self, otp: &str) -> Self {
        self.with_backend(|b| b.otp = otp.to_string())
    }

    /// Resend quota and cooldown
    #[must_use]
    pub fn with_resend_quota(self, attempts: u32, cooldown_secs: u64) -> Self {
        self.with_backend(|b| {
            b.resend_attempts = attempts;
            b.resend_cooldown_secs = cooldown_secs;
        })
    }

    /// Answer resends without the quota payload
    #[must_use]
    pub fn without_resend_payload(self) -> Self {
        self.with_backend(|b| b.resend_payload = false)
    }

    /// Accept a password reset token
    #[must_use]
    pub fn with_reset_token(self, token: &str) -> Self {
        self.with_backend(|b| {
            b.reset_tokens.insert(token.to_string());
        })
    }

    /// Seed the watchlist
    #[must_use]
    pub fn with_watchlist(self, items: Vec<WatchlistItem>) -> Self {
        self.with_backend(|b| b.watchlist = items)
    }

    /// Make the next call to `endpoint` fail with `error`
    ///
    /// Endpoint names are the trait method names, e.g. `"search"`.
    pub fn fail_next(&self, endpoint: &'static str, error: ApiError) {
        if let Ok(mut backend) = self.backend.lock() {
            backend.failures.entry(endpoint).or_default().push_back(error);
        }
    }

    /// Every call made so far, e.g. `"search naruto page=2 limit=20"`
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.backend.lock().map(|b| b.calls.clone()).unwrap_or_default()
    }

    /// Number of calls to one endpoint
    #[must_use]
    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.split(' ').next() == Some(endpoint))
            .count()
    }

    /// Whether an account's email is verified
    #[must_use]
    pub fn is_verified(&self, email: &str) -> bool {
        self.backend
            .lock()
            .ok()
            .and_then(|b| b.accounts.get(email).map(|a| a.verified))
            .unwrap_or(false)
    }

    /// Record a call and pop a scripted failure for it
    fn enter(&self, endpoint: &'static str, detail: &str) -> ApiResult<MutexGuard<'_, Backend>> {
        let mut backend = self.lock()?;
        let call = if detail.is_empty() {
            endpoint.to_string()
        } else {
            format!("{endpoint} {detail}")
        };
        backend.calls.push(call);
        if let Some(error) = backend.failures.get_mut(endpoint).and_then(VecDeque::pop_front) {
            return Err(error);
        }
        Ok(backend)
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

fn status(status: u16, message: &str) -> ApiError {
    ApiError::Status {
        status,
        message: Some(message.to_string()),
    }
}

fn ack(message: &str) -> Ack {
    Ack {
        message: Some(message.to_string()),
    }
}

/// Slice `items` like the backend: 404 past the last page
fn paginate(items: &[Anime], page: u32, limit: u32) -> ApiResult<Paginated<Anime>> {
    let limit = limit.max(1);
    let total_results = u32::try_from(items.len()).unwrap_or(u32::MAX);
    let total_pages = total_results.div_ceil(limit);

    if page == 0 || (page > total_pages && page > 1) {
        return Err(status(404, "Page not found"));
    }

    let start = ((page - 1) * limit) as usize;
    let data = items.iter().skip(start).take(limit as usize).cloned().collect();

    Ok(Paginated {
        data,
        meta: Some(PageMeta {
            page,
            limit,
            total_pages,
            total_results,
        }),
    })
}

impl AnimeApi for MockApi {
    fn catalog(
        &self,
        category: CatalogCategory,
        page: u32,
        limit: u32,
    ) -> impl Future<Output = ApiResult<Paginated<Anime>>> + Send {
        let result = self
            .enter("catalog", &format!("{category} page={page} limit={limit}"))
            .and_then(|b| paginate(b.catalogs.get(&category).map_or(&[][..], Vec::as_slice), page, limit));
        async move { result }
    }

    fn current_season(&self) -> impl Future<Output = ApiResult<SeasonData>> + Send {
        let result = self.enter("current_season", "").map(|b| b.current_season.clone());
        async move { result }
    }

    fn season(&self, year: i32, season: &str) -> impl Future<Output = ApiResult<SeasonData>> + Send {
        let result = self.enter("season", &format!("{year} {season}")).and_then(|b| {
            b.seasons
                .get(&(year, season.to_string()))
                .cloned()
                .ok_or_else(|| status(404, "Season not found"))
        });
        async move { result }
    }

    fn schedule(&self) -> impl Future<Output = ApiResult<Schedule>> + Send {
        let result = self.enter("schedule", "").map(|b| b.schedule.clone());
        async move { result }
    }

    fn search(
        &self,
        query: &str,
        page: u32,
        limit: u32,
        filters: &SearchFilters,
    ) -> impl Future<Output = ApiResult<Paginated<Anime>>> + Send {
        let result = self
            .enter("search", &format!("{query} page={page} limit={limit}"))
            .and_then(|b| {
                let items: Vec<Anime> = b
                    .search
                    .get(query)
                    .map(|items| {
                        items
                            .iter()
                            .filter(|a| filters.kind.is_none() || a.kind == filters.kind)
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                paginate(&items, page, limit)
            });
        async move { result }
    }

    fn details(&self, id: AnimeId) -> impl Future<Output = ApiResult<AnimeDetails>> + Send {
        let result = self
            .enter("details", &id.to_string())
            .and_then(|b| b.details.get(&id).cloned().ok_or_else(|| status(404, "Anime not found")));
        async move { result }
    }
}

impl AuthApi for MockApi {
    fn register(&self, registration: &Registration) -> impl Future<Output = ApiResult<Ack>> + Send {
        let result = self.enter("register", &registration.email).and_then(|mut b| {
            if b.accounts.contains_key(&registration.email) {
                return Err(status(400, "Email already registered"));
            }
            b.accounts.insert(
                registration.email.clone(),
                Account {
                    profile: UserProfile::new(&registration.name, &registration.email),
                    password: registration.password.clone(),
                    verified: false,
                },
            );
            Ok(ack("Registration successful. Please verify your email."))
        });
        async move { result }
    }

    fn login(&self, credentials: &Credentials) -> impl Future<Output = ApiResult<LoginData>> + Send {
        let result = self.enter("login", &credentials.email).and_then(|mut b| {
            let account = b
                .accounts
                .get(&credentials.email)
                .cloned()
                .ok_or_else(|| ApiError::Unauthorized {
                    message: Some("Email not registered".to_string()),
                })?;
            if account.password != credentials.password {
                return Err(ApiError::Unauthorized {
                    message: Some("Incorrect password".to_string()),
                });
            }
            if !account.verified {
                return Err(status(403, "Please verify your email before logging in"));
            }
            b.signed_in = Some(credentials.email.clone());
            Ok(LoginData {
                token: format!("token-{}", credentials.email),
                user: account.profile,
            })
        });
        async move { result }
    }

    fn verify_email(&self, request: &VerifyEmailRequest) -> impl Future<Output = ApiResult<Ack>> + Send {
        let result = self.enter("verify_email", &request.email).and_then(|mut b| {
            if request.otp != b.otp {
                return Err(status(400, "Invalid or expired verification code"));
            }
            let account = b
                .accounts
                .get_mut(&request.email)
                .ok_or_else(|| status(404, "User not found"))?;
            account.verified = true;
            Ok(ack("Email verified successfully"))
        });
        async move { result }
    }

    fn resend_verification(&self, email: &str) -> impl Future<Output = ApiResult<Option<ResendData>>> + Send {
        let result = self.enter("resend_verification", email).and_then(|mut b| {
            if b.resend_attempts == 0 {
                return Err(status(429, "Maximum resend limit reached. Try again in 5h 59m"));
            }
            b.resend_attempts -= 1;
            Ok(b.resend_payload.then_some(ResendData {
                attempts_left: b.resend_attempts,
                next_resend_available_in: b.resend_cooldown_secs,
            }))
        });
        async move { result }
    }

    fn forgot_password(&self, email: &str) -> impl Future<Output = ApiResult<Ack>> + Send {
        let result = self
            .enter("forgot_password", email)
            .map(|_| ack("Password reset email sent"));
        async move { result }
    }

    fn validate_reset_token(&self, token: &str) -> impl Future<Output = ApiResult<Ack>> + Send {
        let result = self.enter("validate_reset_token", token).and_then(|b| {
            if b.reset_tokens.contains(token) {
                Ok(ack("Token is valid"))
            } else {
                Err(status(400, "Invalid or expired token"))
            }
        });
        async move { result }
    }

    fn reset_password(
        &self,
        token: &str,
        _password: &str,
    ) -> impl Future<Output = ApiResult<ResetPasswordData>> + Send {
        let result = self.enter("reset_password", token).and_then(|mut b| {
            if b.reset_tokens.remove(token) {
                Ok(ResetPasswordData {
                    token: Some(format!("token-reset-{token}")),
                })
            } else {
                Err(status(400, "Invalid or expired token"))
            }
        });
        async move { result }
    }

    fn current_user(&self) -> impl Future<Output = ApiResult<UserProfile>> + Send {
        let result = self.enter("current_user", "").and_then(|b| {
            b.signed_in
                .as_ref()
                .and_then(|email| b.accounts.get(email))
                .map(|a| a.profile.clone())
                .ok_or(ApiError::Unauthorized {
                    message: Some("Not authorized".to_string()),
                })
        });
        async move { result }
    }

    fn update_password(&self, update: &PasswordUpdate) -> impl Future<Output = ApiResult<Ack>> + Send {
        let result = self.enter("update_password", "").and_then(|mut b| {
            let email = b.signed_in.clone().ok_or(ApiError::Unauthorized { message: None })?;
            let account = b
                .accounts
                .get_mut(&email)
                .ok_or(ApiError::Unauthorized { message: None })?;
            if account.password != update.current_password {
                return Err(status(400, "Current password is incorrect"));
            }
            account.password.clone_from(&update.new_password);
            Ok(ack("Password updated"))
        });
        async move { result }
    }

    fn logout(&self) -> impl Future<Output = ApiResult<Ack>> + Send {
        let result = self.enter("logout", "").map(|mut b| {
            b.signed_in = None;
            ack("Logged out")
        });
        async move { result }
    }
}

impl UserApi for MockApi {
    fn watchlist(&self) -> impl Future<Output = ApiResult<Vec<WatchlistItem>>> + Send {
        let result = self.enter("watchlist", "").map(|b| b.watchlist.clone());
        async move { result }
    }

    fn add_to_watchlist(
        &self,
        item: &WatchlistItem,
    ) -> impl Future<Output = ApiResult<Vec<WatchlistItem>>> + Send {
        let result = self
            .enter("add_to_watchlist", &item.anime_id.to_string())
            .map(|mut b| {
                b.watchlist.retain(|existing| existing.anime_id != item.anime_id);
                b.watchlist.push(item.clone());
                b.watchlist.clone()
            });
        async move { result }
    }

    fn update_watchlist_item(
        &self,
        anime_id: AnimeId,
        update: &WatchlistUpdate,
    ) -> impl Future<Output = ApiResult<WatchlistItem>> + Send {
        let result = self
            .enter("update_watchlist_item", &anime_id.to_string())
            .and_then(|mut b| {
                let item = b
                    .watchlist
                    .iter_mut()
                    .find(|item| item.anime_id == anime_id)
                    .ok_or_else(|| status(404, "Anime not in watchlist"))?;
                if update.status.is_some() {
                    item.status.clone_from(&update.status);
                }
                Ok(item.clone())
            });
        async move { result }
    }

    fn remove_from_watchlist(&self, anime_id: AnimeId) -> impl Future<Output = ApiResult<Ack>> + Send {
        let result = self
            .enter("remove_from_watchlist", &anime_id.to_string())
            .map(|mut b| {
                b.watchlist.retain(|item| item.anime_id != anime_id);
                ack("Removed from watchlist")
            });
        async move { result }
    }

    fn watch_history(&self) -> impl Future<Output = ApiResult<Vec<HistoryEntry>>> + Send {
        let result = self.enter("watch_history", "").map(|b| b.history.clone());
        async move { result }
    }

    fn update_watch_history(
        &self,
        entry: &HistoryEntry,
    ) -> impl Future<Output = ApiResult<Vec<HistoryEntry>>> + Send {
        let result = self
            .enter("update_watch_history", &entry.anime_id.to_string())
            .map(|mut b| {
                b.history.insert(0, entry.clone());
                b.history.clone()
            });
        async move { result }
    }

    fn update_profile(&self, update: &ProfileUpdate) -> impl Future<Output = ApiResult<UserProfile>> + Send {
        let result = self.enter("update_profile", "").and_then(|mut b| {
            let email = b.signed_in.clone().ok_or(ApiError::Unauthorized { message: None })?;
            let account = b
                .accounts
                .get_mut(&email)
                .ok_or(ApiError::Unauthorized { message: None })?;
            if let Some(name) = &update.name {
                account.profile.name.clone_from(name);
            }
            Ok(account.profile.clone())
        });
        async move { result }
    }

    fn delete_account(&self) -> impl Future<Output = ApiResult<Ack>> + Send {
        let result = self.enter("delete_account", "").and_then(|mut b| {
            let email = b.signed_in.take().ok_or(ApiError::Unauthorized { message: None })?;
            b.accounts.remove(&email);
            Ok(ack("Account deleted"))
        });
        async move { result }
    }

    fn upgrade_to_premium(&self) -> impl Future<Output = ApiResult<Ack>> + Send {
        let result = self.enter("upgrade_to_premium", "").and_then(|mut b| {
            let email = b.signed_in.clone().ok_or(ApiError::Unauthorized { message: None })?;
            if let Some(account) = b.accounts.get_mut(&email) {
                account.profile.is_premium = true;
            }
            Ok(ack("Upgraded to premium"))
        });
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(count: u64) -> Vec<Anime> {
        (1..=count).map(|id| Anime::new(id, format!("Naruto {id}"))).collect()
    }

    #[tokio::test]
    async fn test_paging_and_404_past_end() {
        let api = MockApi::new().with_search_results("naruto", titles(45));
        let filters = SearchFilters::default();

        let page = api.search("naruto", 3, 20, &filters).await;
        let page = page.ok();
        assert_eq!(page.as_ref().map(|p| p.data.len()), Some(5));
        assert_eq!(page.and_then(|p| p.meta).map(|m| m.total_pages), Some(3));

        let past_end = api.search("naruto", 4, 20, &filters).await;
        assert_eq!(past_end.err().and_then(|e| e.status()), Some(404));
        assert_eq!(api.call_count("search"), 2);
    }

    #[tokio::test]
    async fn test_empty_first_page_is_not_404() {
        let api = MockApi::new();
        let page = api.catalog(CatalogCategory::Top, 1, 20).await;
        assert_eq!(page.ok().map(|p| p.data.len()), Some(0));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let api = MockApi::new()
            .with_account("Rin", "rin@example.com", "Secret123", true)
            .with_account("Len", "len@example.com", "Secret123", false);

        let unknown = Credentials {
            email: "nobody@example.com".to_string(),
            password: "x".to_string(),
        };
        assert!(matches!(api.login(&unknown).await, Err(ApiError::Unauthorized { .. })));

        let unverified = Credentials {
            email: "len@example.com".to_string(),
            password: "Secret123".to_string(),
        };
        assert_eq!(api.login(&unverified).await.err().and_then(|e| e.status()), Some(403));

        let ok = Credentials {
            email: "rin@example.com".to_string(),
            password: "Secret123".to_string(),
        };
        assert_eq!(api.login(&ok).await.ok().map(|l| l.token), Some("token-rin@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_resend_quota() {
        let api = MockApi::new().with_resend_quota(1, 30);

        let first = api.resend_verification("rin@example.com").await;
        assert_eq!(
            first.ok().flatten(),
            Some(ResendData {
                attempts_left: 0,
                next_resend_available_in: 30
            })
        );
        assert_eq!(
            api.resend_verification("rin@example.com").await.err().and_then(|e| e.status()),
            Some(429)
        );
    }

    #[tokio::test]
    async fn test_scripted_failure_consumed_once() {
        let api = MockApi::new();
        api.fail_next("schedule", ApiError::Network("down".to_string()));

        assert!(api.schedule().await.is_err());
        assert!(api.schedule().await.is_ok());
    }
}
