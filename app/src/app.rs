//! Application root: state, actions, the combined reducer and the store.
//!
//! Slices never talk to each other directly. Flows that span slices
//! (verification success clearing the OTP record, a refused login starting a
//! resend, toasts for auth outcomes) live in [`CoordinatorReducer`], which runs
//! after every slice has reduced the action and so observes their results.

use std::sync::Arc;

use sugoi_client::{classify, FailureKind, SessionEvent, SugoiApi};
use sugoi_core::composition::{BoxedReducer, CombinedReducer};
use sugoi_core::effect::Effect;
use sugoi_core::reducer::Reducer;
use sugoi_core::{combine_reducers, scope_reducer, SmallVec};
use sugoi_runtime::Store;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::environment::AppEnvironment;
use crate::slices::anime::{AnimeAction, AnimeReducer, AnimeState};
use crate::slices::auth::{AuthAction, AuthOp, AuthReducer, AuthState};
use crate::slices::search::{SearchAction, SearchReducer, SearchState};
use crate::slices::ui::{NotificationKind, UiAction, UiReducer, UiState};
use crate::slices::verification::{
    attempts_phrase, ResendOrigin, ResendPhase, VerificationAction, VerificationReducer,
    VerificationState, RESEND_FAILED,
};
use crate::slices::watchlist::{WatchlistAction, WatchlistReducer, WatchlistState};

/// Toast after a code is accepted
pub const EMAIL_VERIFIED: &str = "Email verified successfully! You can now login.";
/// Toast after sign-in
pub const LOGIN_SUCCESSFUL: &str = "Login successful! Welcome back.";
/// Toast after sign-up
pub const CODE_SENT: &str = "Verification code sent to your email";
/// Toast after a refused login triggered a resend
pub const CODE_SENT_AFTER_LOGIN: &str = "We've sent a new verification code to your email";
/// Toast when that resend was refused without a server message
pub const CODE_NOT_SENT_AFTER_LOGIN: &str =
    "Couldn't send verification code. You may need to wait before requesting another one.";
/// Toast after a reset email was sent
pub const RESET_EMAIL_SENT: &str = "Password reset email sent successfully.";

/// Whole client state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// Catalogs, seasons, schedule, details and view-all
    pub anime: AnimeState,
    /// Session and auth flows
    pub auth: AuthState,
    /// Search results, suggestions, filters and recent searches
    pub search: SearchState,
    /// Watchlist and history
    pub watchlist: WatchlistState,
    /// Theme, sidebar and toasts
    pub ui: UiState,
    /// OTP resend cooldown
    pub verification: VerificationState,
}

/// Every action the client understands
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Anime slice
    Anime(AnimeAction),
    /// Auth slice
    Auth(AuthAction),
    /// Search slice
    Search(SearchAction),
    /// Watchlist slice
    Watchlist(WatchlistAction),
    /// UI slice
    Ui(UiAction),
    /// Verification slice
    Verification(VerificationAction),
    /// The HTTP adapter saw a 401 on a protected endpoint
    SessionExpired {
        /// Route to navigate to
        redirect_to: String,
    },
}

impl From<SessionEvent> for AppAction {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::Expired { redirect_to } => Self::SessionExpired { redirect_to },
        }
    }
}

fn anime_state(state: &mut AppState) -> &mut AnimeState {
    &mut state.anime
}

fn anime_action(action: AppAction) -> Option<AnimeAction> {
    match action {
        AppAction::Anime(action) => Some(action),
        _ => None,
    }
}

fn auth_state(state: &mut AppState) -> &mut AuthState {
    &mut state.auth
}

fn auth_action(action: AppAction) -> Option<AuthAction> {
    match action {
        AppAction::Auth(action) => Some(action),
        AppAction::SessionExpired { redirect_to } => Some(AuthAction::SessionExpired { redirect_to }),
        _ => None,
    }
}

fn search_state(state: &mut AppState) -> &mut SearchState {
    &mut state.search
}

fn search_action(action: AppAction) -> Option<SearchAction> {
    match action {
        AppAction::Search(action) => Some(action),
        _ => None,
    }
}

fn watchlist_state(state: &mut AppState) -> &mut WatchlistState {
    &mut state.watchlist
}

fn watchlist_action(action: AppAction) -> Option<WatchlistAction> {
    match action {
        AppAction::Watchlist(action) => Some(action),
        _ => None,
    }
}

fn ui_state(state: &mut AppState) -> &mut UiState {
    &mut state.ui
}

fn ui_action(action: AppAction) -> Option<UiAction> {
    match action {
        AppAction::Ui(action) => Some(action),
        _ => None,
    }
}

fn verification_state(state: &mut AppState) -> &mut VerificationState {
    &mut state.verification
}

fn verification_action(action: AppAction) -> Option<VerificationAction> {
    match action {
        AppAction::Verification(action) => Some(action),
        _ => None,
    }
}

/// Cross-slice flows
///
/// Reduces follow-up actions into the verification and UI slices in the same
/// step, so a flow settles together with the action that started it.
#[derive(Debug, Clone)]
pub struct CoordinatorReducer<Api> {
    verification: VerificationReducer<Api>,
    ui: UiReducer<Api>,
}

impl<Api> CoordinatorReducer<Api> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            verification: VerificationReducer::new(),
            ui: UiReducer::new(),
        }
    }
}

impl<Api> Default for CoordinatorReducer<Api> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Api: SugoiApi> CoordinatorReducer<Api> {
    fn notify(
        &self,
        state: &mut AppState,
        env: &AppEnvironment<Api>,
        kind: NotificationKind,
        message: impl Into<String>,
    ) {
        let _ = self.ui.reduce(&mut state.ui, UiAction::notify(kind, message), env);
    }

    fn forward_verification(
        &self,
        state: &mut AppState,
        env: &AppEnvironment<Api>,
        action: VerificationAction,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        self.verification
            .reduce(&mut state.verification, action, env)
            .into_iter()
            .map(|effect| effect.map(AppAction::Verification))
            .collect()
    }

    fn on_auth(
        &self,
        state: &mut AppState,
        env: &AppEnvironment<Api>,
        action: &AuthAction,
    ) -> SmallVec<[Effect<AppAction>; 4]> {
        match action {
            AuthAction::RegisterSucceeded { email, .. } => {
                self.notify(state, env, NotificationKind::Success, CODE_SENT);
                self.forward_verification(state, env, VerificationAction::Restore { email: email.clone() })
            },
            AuthAction::LoginSucceeded { .. } => {
                self.notify(state, env, NotificationKind::Success, LOGIN_SUCCESSFUL);
                SmallVec::new()
            },
            AuthAction::LoginFailed { token, email, error }
                if state.auth.requests.is_current(AuthOp::Login, *token)
                    && classify(error) == FailureKind::PendingVerification =>
            {
                tracing::info!("Login refused for unverified account; resending code");
                let mut effects =
                    self.forward_verification(state, env, VerificationAction::Restore { email: email.clone() });
                if !state.verification.can_resend() {
                    tracing::info!(
                        remaining = state.verification.cooldown_seconds_remaining,
                        "Code still cooling down; not resending"
                    );
                    self.notify(state, env, NotificationKind::Warning, CODE_NOT_SENT_AFTER_LOGIN);
                    return effects;
                }
                effects.extend(self.forward_verification(
                    state,
                    env,
                    VerificationAction::Resend {
                        email: email.clone(),
                        origin: ResendOrigin::Login,
                    },
                ));
                effects
            },
            AuthAction::VerifyEmailSucceeded { .. } => {
                self.notify(state, env, NotificationKind::Success, EMAIL_VERIFIED);
                self.forward_verification(state, env, VerificationAction::Completed)
            },
            AuthAction::ForgotPasswordSucceeded { .. } => {
                self.notify(state, env, NotificationKind::Success, RESET_EMAIL_SENT);
                SmallVec::new()
            },
            _ => SmallVec::new(),
        }
    }

    fn on_verification(&self, state: &mut AppState, env: &AppEnvironment<Api>, action: &VerificationAction) {
        match action {
            VerificationAction::ResendSucceeded { email, origin, .. }
                if state.verification.email.as_deref() == Some(email.as_str()) =>
            {
                match origin {
                    ResendOrigin::User => {
                        let message = format!(
                            "Verification code resent to your email. You have {} left.",
                            attempts_phrase(state.verification.attempts_left)
                        );
                        self.notify(state, env, NotificationKind::Success, message);
                    },
                    ResendOrigin::Login => {
                        self.notify(state, env, NotificationKind::Info, CODE_SENT_AFTER_LOGIN);
                    },
                }
            },
            VerificationAction::ResendFailed { origin, error, .. } => match origin {
                ResendOrigin::Login => {
                    let message = error.message_or(CODE_NOT_SENT_AFTER_LOGIN);
                    self.notify(state, env, NotificationKind::Warning, message);
                },
                ResendOrigin::User => {
                    let kind = if state.verification.phase == ResendPhase::RateLimited {
                        NotificationKind::Warning
                    } else {
                        NotificationKind::Error
                    };
                    let message = state
                        .verification
                        .notice
                        .clone()
                        .unwrap_or_else(|| error.message_or(RESEND_FAILED));
                    self.notify(state, env, kind, message);
                },
            },
            _ => {},
        }
    }
}

impl<Api: SugoiApi> Reducer for CoordinatorReducer<Api> {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment<Api>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match &action {
            AppAction::Auth(action) => self.on_auth(state, env, action),
            AppAction::Verification(action) => {
                self.on_verification(state, env, action);
                SmallVec::new()
            },
            _ => SmallVec::new(),
        }
    }
}

/// Root reducer: every slice scoped into [`AppState`], then the coordinator
pub struct AppReducer<Api: SugoiApi> {
    inner: CombinedReducer<AppState, AppAction, AppEnvironment<Api>>,
}

impl<Api: SugoiApi> Clone for AppReducer<Api> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<Api: SugoiApi> std::fmt::Debug for AppReducer<Api> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppReducer").finish_non_exhaustive()
    }
}

impl<Api: SugoiApi> AppReducer<Api> {
    /// Compose the slices
    #[must_use]
    pub fn new() -> Self {
        let reducers: Vec<BoxedReducer<AppState, AppAction, AppEnvironment<Api>>> = vec![
            Arc::new(scope_reducer(
                AnimeReducer::new(),
                anime_state,
                anime_action,
                AppAction::Anime,
            )),
            Arc::new(scope_reducer(AuthReducer::new(), auth_state, auth_action, AppAction::Auth)),
            Arc::new(scope_reducer(
                SearchReducer::new(),
                search_state,
                search_action,
                AppAction::Search,
            )),
            Arc::new(scope_reducer(
                WatchlistReducer::new(),
                watchlist_state,
                watchlist_action,
                AppAction::Watchlist,
            )),
            Arc::new(scope_reducer(UiReducer::new(), ui_state, ui_action, AppAction::Ui)),
            Arc::new(scope_reducer(
                VerificationReducer::new(),
                verification_state,
                verification_action,
                AppAction::Verification,
            )),
            Arc::new(CoordinatorReducer::new()),
        ];
        Self {
            inner: combine_reducers(reducers),
        }
    }
}

impl<Api: SugoiApi> Default for AppReducer<Api> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Api: SugoiApi> Reducer for AppReducer<Api> {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment<Api>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        self.inner.reduce(state, action, env)
    }
}

/// Store over the whole client
pub type AppStore<Api> = Store<AppState, AppAction, AppEnvironment<Api>, AppReducer<Api>>;

/// Build a store with default state
#[must_use]
pub fn app_store<Api: SugoiApi>(env: AppEnvironment<Api>) -> AppStore<Api> {
    Store::new(AppState::default(), AppReducer::new(), env)
}

/// Feed session events from the HTTP adapter into the store
///
/// Runs until the adapter is dropped.
pub fn forward_session_events<Api: SugoiApi>(
    store: Arc<AppStore<Api>>,
    mut events: broadcast::Receiver<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let _ = store.send(AppAction::from(event)).await;
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Session event listener lagged");
                },
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::slices::test_support::env_with;
    use sugoi_client::mocks::MockApi;
    use sugoi_client::ResendCooldownRecord;
    use sugoi_testing::helpers::run_effects;
    use sugoi_testing::test_epoch;

    const EMAIL: &str = "orihime@example.com";

    async fn dispatch(
        reducer: &AppReducer<MockApi>,
        state: &mut AppState,
        env: &AppEnvironment<MockApi>,
        action: AppAction,
    ) -> Vec<AppAction> {
        let effects = reducer.reduce(state, action, env);
        let mut follow_ups = Vec::new();
        for feedback in run_effects(effects).await {
            let effects = reducer.reduce(state, feedback, env);
            follow_ups.extend(run_effects(effects).await);
        }
        follow_ups
    }

    #[tokio::test]
    async fn test_verification_success_clears_otp_and_toasts() {
        let (env, _) = env_with(MockApi::new().with_account("Orihime", EMAIL, "Shun5hun", false));
        env.session
            .save_resend_cooldown(&ResendCooldownRecord {
                email: EMAIL.to_string(),
                cooldown_end: Some(test_epoch()),
                attempts_left: Some(2),
                rate_limit_end: Some(test_epoch()),
            })
            .unwrap();
        env.session.set_pending_verification_email(EMAIL).unwrap();
        let reducer = AppReducer::new();
        let mut state = AppState::default();

        dispatch(
            &reducer,
            &mut state,
            &env,
            AppAction::Auth(AuthAction::VerifyEmail {
                email: EMAIL.to_string(),
                otp: sugoi_client::mocks::DEFAULT_OTP.to_string(),
            }),
        )
        .await;

        assert!(!state.auth.session.is_authenticated);
        assert_eq!(env.session.resend_cooldown().unwrap(), None);
        assert_eq!(env.session.pending_verification_email().unwrap(), None);
        assert_eq!(state.ui.notification.message, EMAIL_VERIFIED);
        assert_eq!(state.ui.notification.kind, NotificationKind::Success);
    }

    #[tokio::test]
    async fn test_unverified_login_resends_code() {
        let (env, _) = env_with(MockApi::new().with_account("Orihime", EMAIL, "Shun5hun", false));
        let reducer = AppReducer::new();
        let mut state = AppState::default();

        let follow_ups = dispatch(
            &reducer,
            &mut state,
            &env,
            AppAction::Auth(AuthAction::Login(crate::validation::LoginForm {
                email: EMAIL.to_string(),
                password: "Shun5hun".to_string(),
            })),
        )
        .await;

        assert_eq!(env.api.call_count("resend_verification"), 1);
        assert!(state.auth.pending_verification);
        for action in follow_ups {
            let _ = reducer.reduce(&mut state, action, &env);
        }
        assert_eq!(state.verification.phase, ResendPhase::CooldownActive);
        assert_eq!(state.ui.notification.message, CODE_SENT_AFTER_LOGIN);
        assert_eq!(state.ui.notification.kind, NotificationKind::Info);
    }

    #[tokio::test]
    async fn test_unverified_login_during_cooldown_warns() {
        let (env, _) = env_with(MockApi::new().with_account("Orihime", EMAIL, "Shun5hun", false));
        env.session
            .save_resend_cooldown(&ResendCooldownRecord {
                email: EMAIL.to_string(),
                cooldown_end: Some(test_epoch() + chrono::Duration::seconds(45)),
                attempts_left: Some(2),
                rate_limit_end: Some(test_epoch() + chrono::Duration::hours(5)),
            })
            .unwrap();
        let reducer = AppReducer::new();
        let mut state = AppState::default();

        dispatch(
            &reducer,
            &mut state,
            &env,
            AppAction::Auth(AuthAction::Login(crate::validation::LoginForm {
                email: EMAIL.to_string(),
                password: "Shun5hun".to_string(),
            })),
        )
        .await;

        assert_eq!(env.api.call_count("resend_verification"), 0);
        assert!(state.auth.pending_verification);
        assert_eq!(state.verification.phase, ResendPhase::CooldownActive);
        assert_eq!(state.verification.cooldown_seconds_remaining, 45);
        assert_eq!(state.ui.notification.message, CODE_NOT_SENT_AFTER_LOGIN);
        assert_eq!(state.ui.notification.kind, NotificationKind::Warning);
    }

    #[tokio::test]
    async fn test_login_toast_survives_later_request() {
        let (env, _) = env_with(MockApi::new().with_account("Orihime", EMAIL, "Shun5hun", true));
        let reducer = AppReducer::new();
        let mut state = AppState::default();

        let login = reducer.reduce(
            &mut state,
            AppAction::Auth(AuthAction::Login(crate::validation::LoginForm {
                email: EMAIL.to_string(),
                password: "Shun5hun".to_string(),
            })),
            &env,
        );
        let _ = reducer.reduce(&mut state, AppAction::Auth(AuthAction::GetCurrentUser), &env);
        for action in run_effects(login).await {
            let _ = reducer.reduce(&mut state, action, &env);
        }

        assert!(state.auth.session.is_authenticated);
        assert_eq!(state.ui.notification.message, LOGIN_SUCCESSFUL);
    }

    #[tokio::test]
    async fn test_user_resend_toast_counts_attempts() {
        let (env, _) = env_with(MockApi::new().with_resend_quota(2, 60));
        let reducer = AppReducer::new();
        let mut state = AppState::default();

        dispatch(
            &reducer,
            &mut state,
            &env,
            AppAction::Verification(VerificationAction::Resend {
                email: EMAIL.to_string(),
                origin: ResendOrigin::User,
            }),
        )
        .await;

        assert_eq!(
            state.ui.notification.message,
            "Verification code resent to your email. You have 1 attempt left."
        );
    }

    #[tokio::test]
    async fn test_rate_limited_resend_warns() {
        let (env, _) = env_with(MockApi::new().with_resend_quota(0, 60));
        let reducer = AppReducer::new();
        let mut state = AppState::default();

        dispatch(
            &reducer,
            &mut state,
            &env,
            AppAction::Verification(VerificationAction::Resend {
                email: EMAIL.to_string(),
                origin: ResendOrigin::User,
            }),
        )
        .await;

        assert_eq!(state.ui.notification.kind, NotificationKind::Warning);
        assert_eq!(
            state.ui.notification.message,
            "Maximum attempts reached. Try again in 5h 59m."
        );
    }

    #[test]
    fn test_session_event_reaches_auth() {
        let (env, _) = env_with(MockApi::new());
        env.session.set_token("stale").unwrap();
        let reducer = AppReducer::new();
        let mut state = AppState::default();
        state.auth.session.is_authenticated = true;

        let effects = reducer.reduce(
            &mut state,
            AppAction::from(SessionEvent::Expired {
                redirect_to: "/auth/login".to_string(),
            }),
            &env,
        );

        assert!(effects.is_empty());
        assert!(!state.auth.session.is_authenticated);
        assert_eq!(state.auth.redirect_to.as_deref(), Some("/auth/login"));
        assert_eq!(env.session.token().unwrap(), None);
    }
}
