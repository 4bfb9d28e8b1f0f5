//! Auth slice: session, sign-up, sign-in, email verification, password reset
//! and account management.
//!
//! Requests are tracked per [`AuthOp`], so a request only supersedes an
//! earlier one of the same kind. Writes (sign-in, sign-out, password and
//! account changes) apply whenever they settle; reads and error banners
//! apply only for the latest request of their kind. Form input is
//! validated before anything is sent; a form that fails validation only
//! fills [`AuthState::field_errors`].

use std::future::Future;
use std::marker::PhantomData;

use sugoi_client::models::{
    Credentials, LoginData, PasswordUpdate, ProfileUpdate, Registration, VerifyEmailRequest,
};
use sugoi_client::{classify, ApiError, ApiResult, FailureKind, SugoiApi, UserProfile};
use sugoi_core::effect::Effect;
use sugoi_core::reducer::Reducer;
use sugoi_core::{smallvec, SmallVec};

use crate::environment::AppEnvironment;
use crate::request::{KeyedRequests, RequestToken};
use crate::slices::{persist, restore};
use crate::validation::{
    validate_code, validate_email, ChangePasswordForm, Field, FieldErrors, LoginForm,
    RegistrationForm, ResetPasswordForm,
};

/// Field message for a login with an unknown email
pub const EMAIL_NOT_REGISTERED: &str = "This email is not registered";

/// Field message for a login with a wrong password
pub const INCORRECT_PASSWORD: &str = "Incorrect password";

/// Kind of auth request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuthOp {
    /// Sign-up
    Register,
    /// Sign-in
    Login,
    /// Sign-out
    Logout,
    /// Code check
    VerifyEmail,
    /// Profile fetch
    CurrentUser,
    /// Reset email
    ForgotPassword,
    /// Reset link check
    ValidateResetToken,
    /// New password from a reset link
    ResetPassword,
    /// Password change while signed in
    UpdatePassword,
    /// Profile change
    UpdateProfile,
    /// Account removal
    DeleteAccount,
    /// Premium upgrade
    UpgradeToPremium,
}

impl AuthOp {
    /// Message shown when the backend sends none
    #[must_use]
    pub const fn fallback(self) -> &'static str {
        match self {
            Self::Register => "Registration failed",
            Self::Login => LOGIN_FAILED,
            Self::Logout => "Logout failed",
            Self::VerifyEmail => "Email verification failed",
            Self::CurrentUser => "Failed to fetch user data",
            Self::ForgotPassword => "Failed to process request",
            Self::ValidateResetToken => "Invalid or expired token",
            Self::ResetPassword => "Password reset failed",
            Self::UpdatePassword => "Failed to update password",
            Self::UpdateProfile => "Failed to update profile",
            Self::DeleteAccount => "Failed to delete account",
            Self::UpgradeToPremium => "Failed to upgrade to premium",
        }
    }
}

/// Message for a failed login without a server message
pub const LOGIN_FAILED: &str = "Login failed";

/// Signed-in user and credential
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthSession {
    /// Profile of the signed-in user
    pub user: Option<UserProfile>,
    /// Bearer token
    pub token: Option<String>,
    /// Whether the user is signed in
    pub is_authenticated: bool,
}

/// Auth state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    /// Current session
    pub session: AuthSession,
    /// In-flight requests per kind and the banner error
    pub requests: KeyedRequests<AuthOp>,
    /// Account exists but its email is unverified
    pub pending_verification: bool,
    /// Address waiting for a verification code
    pub pending_email: Option<String>,
    /// Reset email sent
    pub forgot_password_success: bool,
    /// Password reset through a link
    pub reset_password_success: bool,
    /// Password changed while signed in
    pub update_password_success: bool,
    /// Reset link accepted by the backend
    pub is_token_valid: bool,
    /// Per-field messages from validation or login
    pub field_errors: FieldErrors,
    /// Route to navigate to after the session expired
    pub redirect_to: Option<String>,
}

impl AuthState {
    /// Whether an auth request is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.requests.is_loading()
    }

    /// Banner error
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.requests.error.as_deref()
    }

    fn purge(&mut self) {
        self.session = AuthSession::default();
    }
}

/// Auth actions
#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    /// Create an account
    Register(RegistrationForm),
    /// Sign in
    Login(LoginForm),
    /// Submit a verification code
    VerifyEmail {
        /// Address being verified
        email: String,
        /// Six-digit code
        otp: String,
    },
    /// Load the signed-in user
    GetCurrentUser,
    /// Sign out
    Logout,
    /// Request a reset email
    ForgotPassword {
        /// Account address
        email: String,
    },
    /// Check a reset link
    ValidateResetToken {
        /// Token from the link
        reset_token: String,
    },
    /// Set a new password through a reset link
    ResetPassword {
        /// Token from the link
        reset_token: String,
        /// New password
        form: ResetPasswordForm,
    },
    /// Change the password while signed in
    UpdatePassword(ChangePasswordForm),
    /// Change profile fields
    UpdateProfile(ProfileUpdate),
    /// Remove the account
    DeleteAccount,
    /// Upgrade the account
    UpgradeToPremium,
    /// The backend rejected the session token
    SessionExpired {
        /// Route to navigate to
        redirect_to: String,
    },
    /// Replace the user; `None` signs out locally
    SetUser(Option<UserProfile>),
    /// Drop the banner error
    ClearError,
    /// Drop per-field messages
    ClearFieldErrors,
    /// Leave the forgot-password screen
    ResetForgotPasswordState,
    /// Leave the reset-password screen
    ResetPasswordResetState,
    /// Forget the reset link check
    ResetTokenValidation,

    /// Account created; a code was emailed
    RegisterSucceeded {
        /// Request it answers
        token: RequestToken,
        /// Address to verify
        email: String,
    },
    /// Signed in
    LoginSucceeded {
        /// Request it answers
        token: RequestToken,
        /// Token and profile
        data: LoginData,
    },
    /// Sign-in refused
    LoginFailed {
        /// Request it answers
        token: RequestToken,
        /// Address used
        email: String,
        /// Cause
        error: ApiError,
    },
    /// Code accepted
    VerifyEmailSucceeded {
        /// Request it answers
        token: RequestToken,
        /// Verified address
        email: String,
    },
    /// Profile loaded
    UserLoaded {
        /// Request it answers
        token: RequestToken,
        /// Profile
        user: UserProfile,
    },
    /// Profile changed
    ProfileUpdated {
        /// Request it answers
        token: RequestToken,
        /// Profile
        user: UserProfile,
    },
    /// Sign-out finished, successfully or not
    LoggedOut {
        /// Request it answers
        token: RequestToken,
        /// Backend failure, if any
        error: Option<ApiError>,
    },
    /// Reset email sent
    ForgotPasswordSucceeded {
        /// Request it answers
        token: RequestToken,
    },
    /// Reset link accepted
    ResetTokenValid {
        /// Request it answers
        token: RequestToken,
    },
    /// Password reset
    ResetPasswordSucceeded {
        /// Request it answers
        token: RequestToken,
        /// Token issued by the backend, if any
        session_token: Option<String>,
    },
    /// Password changed
    PasswordUpdated {
        /// Request it answers
        token: RequestToken,
    },
    /// Account removed
    AccountDeleted {
        /// Request it answers
        token: RequestToken,
    },
    /// Account upgraded
    PremiumActivated {
        /// Request it answers
        token: RequestToken,
    },
    /// Any other request failed
    Failed {
        /// Request it answers
        token: RequestToken,
        /// What it was
        op: AuthOp,
        /// Cause
        error: ApiError,
    },
}

/// Auth reducer
#[derive(Debug, Clone)]
pub struct AuthReducer<Api> {
    _phantom: PhantomData<fn() -> Api>,
}

impl<Api> AuthReducer<Api> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<Api> Default for AuthReducer<Api> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Api: SugoiApi> AuthReducer<Api> {
    /// Effect awaiting `call` and settling `token` with its outcome
    fn request<T, F>(
        token: RequestToken,
        op: AuthOp,
        call: F,
        on_success: impl FnOnce(T) -> AuthAction + Send + 'static,
    ) -> SmallVec<[Effect<AuthAction>; 4]>
    where
        T: Send + 'static,
        F: Future<Output = ApiResult<T>> + Send + 'static,
    {
        smallvec![Effect::future(async move {
            Some(match call.await {
                Ok(value) => on_success(value),
                Err(error) => AuthAction::Failed { token, op, error },
            })
        })]
    }

    /// Record field errors; `true` when the form may be sent
    fn accept(state: &mut AuthState, validation: Result<(), FieldErrors>) -> bool {
        match validation {
            Ok(()) => {
                state.field_errors.clear();
                true
            },
            Err(errors) => {
                tracing::debug!(fields = errors.len(), "Form rejected by validation");
                state.field_errors = errors;
                false
            },
        }
    }

    fn clear_session(state: &mut AuthState, env: &AppEnvironment<Api>) {
        // A profile fetched before the sign-out must not sign the user back in
        state.requests.invalidate(AuthOp::CurrentUser);
        state.purge();
        persist("token", env.session.clear_token());
    }
}

impl<Api: SugoiApi> Reducer for AuthReducer<Api> {
    type State = AuthState;
    type Action = AuthAction;
    type Environment = AppEnvironment<Api>;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════════
            // Sign-up and sign-in
            // ═══════════════════════════════════════════════════════════════
            AuthAction::Register(form) => {
                if !Self::accept(state, form.validate()) {
                    return SmallVec::new();
                }
                let registration = Registration {
                    name: form.name.trim().to_string(),
                    email: form.email.trim().to_string(),
                    password: form.password,
                };
                let email = registration.email.clone();
                let token = state.requests.begin(AuthOp::Register);
                let api = env.api.clone();
                Self::request(
                    token,
                    AuthOp::Register,
                    async move { api.register(&registration).await },
                    move |_| AuthAction::RegisterSucceeded { token, email },
                )
            },

            AuthAction::Login(form) => {
                if !Self::accept(state, form.validate()) {
                    return SmallVec::new();
                }
                state.pending_verification = false;
                let credentials = Credentials {
                    email: form.email.trim().to_string(),
                    password: form.password,
                };
                let token = state.requests.begin(AuthOp::Login);
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.login(&credentials).await {
                        Ok(data) => AuthAction::LoginSucceeded { token, data },
                        Err(error) => AuthAction::LoginFailed {
                            token,
                            email: credentials.email,
                            error,
                        },
                    })
                })]
            },

            AuthAction::VerifyEmail { email, otp } => {
                let otp = otp.trim().to_string();
                let mut errors = FieldErrors::new();
                if let Err(error) = validate_code(&otp) {
                    errors.insert(Field::VerificationCode, error.to_string());
                }
                if !Self::accept(state, if errors.is_empty() { Ok(()) } else { Err(errors) }) {
                    return SmallVec::new();
                }
                let request = VerifyEmailRequest {
                    email: email.clone(),
                    otp,
                };
                let token = state.requests.begin(AuthOp::VerifyEmail);
                let api = env.api.clone();
                Self::request(
                    token,
                    AuthOp::VerifyEmail,
                    async move { api.verify_email(&request).await },
                    move |_| AuthAction::VerifyEmailSucceeded { token, email },
                )
            },

            AuthAction::RegisterSucceeded { token, email } => {
                state.requests.settle(AuthOp::Register, token);
                persist(
                    "pending verification email",
                    env.session.set_pending_verification_email(&email),
                );
                state.pending_verification = true;
                state.pending_email = Some(email);
                SmallVec::new()
            },

            AuthAction::LoginSucceeded { token, data } => {
                state.requests.settle(AuthOp::Login, token);
                persist("token", env.session.set_token(&data.token));
                state.session = AuthSession {
                    user: Some(data.user),
                    token: Some(data.token),
                    is_authenticated: true,
                };
                state.pending_verification = false;
                state.redirect_to = None;
                SmallVec::new()
            },

            AuthAction::LoginFailed { token, email, error } => {
                if !state.requests.settle(AuthOp::Login, token) {
                    return SmallVec::new();
                }
                match classify(&error) {
                    FailureKind::EmailNotRegistered => {
                        state.field_errors.insert(Field::Email, EMAIL_NOT_REGISTERED.to_string());
                    },
                    FailureKind::IncorrectPassword => {
                        state.field_errors.insert(Field::Password, INCORRECT_PASSWORD.to_string());
                    },
                    FailureKind::PendingVerification => {
                        persist(
                            "pending verification email",
                            env.session.set_pending_verification_email(&email),
                        );
                        state.pending_verification = true;
                        state.pending_email = Some(email);
                        state.requests.error = Some(error.message_or(LOGIN_FAILED));
                    },
                    _ => state.requests.error = Some(error.message_or(LOGIN_FAILED)),
                }
                SmallVec::new()
            },

            AuthAction::VerifyEmailSucceeded { token, email } => {
                state.requests.settle(AuthOp::VerifyEmail, token);
                if state.pending_email.as_deref().is_none_or(|p| p == email) {
                    state.pending_verification = false;
                    state.pending_email = None;
                }
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Session
            // ═══════════════════════════════════════════════════════════════
            AuthAction::GetCurrentUser => {
                let token = state.requests.begin(AuthOp::CurrentUser);
                let api = env.api.clone();
                Self::request(
                    token,
                    AuthOp::CurrentUser,
                    async move { api.current_user().await },
                    move |user| AuthAction::UserLoaded { token, user },
                )
            },

            AuthAction::UserLoaded { token, user } => {
                if state.requests.settle(AuthOp::CurrentUser, token) {
                    if state.session.token.is_none() {
                        state.session.token = restore("token", env.session.token());
                    }
                    state.session.user = Some(user);
                    state.session.is_authenticated = true;
                }
                SmallVec::new()
            },

            AuthAction::Logout => {
                let token = state.requests.begin(AuthOp::Logout);
                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(AuthAction::LoggedOut {
                        token,
                        error: api.logout().await.err(),
                    })
                })]
            },

            AuthAction::LoggedOut { token, error } => {
                if let Some(error) = error {
                    tracing::warn!(%error, "Logout call failed; clearing session anyway");
                }
                state.requests.settle(AuthOp::Logout, token);
                Self::clear_session(state, env);
                SmallVec::new()
            },

            AuthAction::SessionExpired { redirect_to } => {
                tracing::info!(%redirect_to, "Session expired");
                state.requests.cancel();
                Self::clear_session(state, env);
                state.redirect_to = Some(redirect_to);
                SmallVec::new()
            },

            AuthAction::SetUser(user) => {
                state.session.is_authenticated = user.is_some();
                state.session.user = user;
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Password reset
            // ═══════════════════════════════════════════════════════════════
            AuthAction::ForgotPassword { email } => {
                let email = email.trim().to_string();
                let mut errors = FieldErrors::new();
                if let Err(error) = validate_email(&email) {
                    errors.insert(Field::Email, error.to_string());
                }
                if !Self::accept(state, if errors.is_empty() { Ok(()) } else { Err(errors) }) {
                    return SmallVec::new();
                }
                state.forgot_password_success = false;
                let token = state.requests.begin(AuthOp::ForgotPassword);
                let api = env.api.clone();
                Self::request(
                    token,
                    AuthOp::ForgotPassword,
                    async move { api.forgot_password(&email).await },
                    move |_| AuthAction::ForgotPasswordSucceeded { token },
                )
            },

            AuthAction::ValidateResetToken { reset_token } => {
                state.is_token_valid = false;
                let token = state.requests.begin(AuthOp::ValidateResetToken);
                let api = env.api.clone();
                Self::request(
                    token,
                    AuthOp::ValidateResetToken,
                    async move { api.validate_reset_token(&reset_token).await },
                    move |_| AuthAction::ResetTokenValid { token },
                )
            },

            AuthAction::ResetPassword { reset_token, form } => {
                if !Self::accept(state, form.validate()) {
                    return SmallVec::new();
                }
                state.reset_password_success = false;
                let token = state.requests.begin(AuthOp::ResetPassword);
                let api = env.api.clone();
                Self::request(
                    token,
                    AuthOp::ResetPassword,
                    async move { api.reset_password(&reset_token, &form.password).await },
                    move |data| AuthAction::ResetPasswordSucceeded {
                        token,
                        session_token: data.token,
                    },
                )
            },

            AuthAction::UpdatePassword(form) => {
                if !Self::accept(state, form.validate()) {
                    return SmallVec::new();
                }
                state.update_password_success = false;
                let update = PasswordUpdate {
                    current_password: form.current_password,
                    new_password: form.new_password,
                };
                let token = state.requests.begin(AuthOp::UpdatePassword);
                let api = env.api.clone();
                Self::request(
                    token,
                    AuthOp::UpdatePassword,
                    async move { api.update_password(&update).await },
                    move |_| AuthAction::PasswordUpdated { token },
                )
            },

            AuthAction::ForgotPasswordSucceeded { token } => {
                state.requests.settle(AuthOp::ForgotPassword, token);
                state.forgot_password_success = true;
                SmallVec::new()
            },

            AuthAction::ResetTokenValid { token } => {
                if state.requests.settle(AuthOp::ValidateResetToken, token) {
                    state.is_token_valid = true;
                }
                SmallVec::new()
            },

            AuthAction::ResetPasswordSucceeded { token, session_token } => {
                state.requests.settle(AuthOp::ResetPassword, token);
                state.reset_password_success = true;
                state.session.token = session_token;
                SmallVec::new()
            },

            AuthAction::PasswordUpdated { token } => {
                state.requests.settle(AuthOp::UpdatePassword, token);
                state.update_password_success = true;
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Account
            // ═══════════════════════════════════════════════════════════════
            AuthAction::UpdateProfile(update) => {
                let token = state.requests.begin(AuthOp::UpdateProfile);
                let api = env.api.clone();
                Self::request(
                    token,
                    AuthOp::UpdateProfile,
                    async move { api.update_profile(&update).await },
                    move |user| AuthAction::ProfileUpdated { token, user },
                )
            },

            AuthAction::DeleteAccount => {
                let token = state.requests.begin(AuthOp::DeleteAccount);
                let api = env.api.clone();
                Self::request(
                    token,
                    AuthOp::DeleteAccount,
                    async move { api.delete_account().await },
                    move |_| AuthAction::AccountDeleted { token },
                )
            },

            AuthAction::UpgradeToPremium => {
                let token = state.requests.begin(AuthOp::UpgradeToPremium);
                let api = env.api.clone();
                Self::request(
                    token,
                    AuthOp::UpgradeToPremium,
                    async move { api.upgrade_to_premium().await },
                    move |_| AuthAction::PremiumActivated { token },
                )
            },

            AuthAction::ProfileUpdated { token, user } => {
                state.requests.settle(AuthOp::UpdateProfile, token);
                if state.session.is_authenticated {
                    state.session.user = Some(user);
                }
                SmallVec::new()
            },

            AuthAction::AccountDeleted { token } => {
                state.requests.settle(AuthOp::DeleteAccount, token);
                Self::clear_session(state, env);
                SmallVec::new()
            },

            AuthAction::PremiumActivated { token } => {
                state.requests.settle(AuthOp::UpgradeToPremium, token);
                if let Some(user) = state.session.user.as_mut() {
                    user.is_premium = true;
                }
                SmallVec::new()
            },

            AuthAction::Failed { token, op, error } => {
                tracing::debug!(?op, %error, "Auth request failed");
                if state.requests.fail(op, token, error.message_or(op.fallback()))
                    && op == AuthOp::CurrentUser
                {
                    state.session.user = None;
                    state.session.is_authenticated = false;
                }
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Flags
            // ═══════════════════════════════════════════════════════════════
            AuthAction::ClearError => {
                state.requests.clear_error();
                SmallVec::new()
            },
            AuthAction::ClearFieldErrors => {
                state.field_errors.clear();
                SmallVec::new()
            },
            AuthAction::ResetForgotPasswordState => {
                state.forgot_password_success = false;
                state.requests.clear_error();
                SmallVec::new()
            },
            AuthAction::ResetPasswordResetState => {
                state.reset_password_success = false;
                state.requests.clear_error();
                SmallVec::new()
            },
            AuthAction::ResetTokenValidation => {
                state.is_token_valid = false;
                state.requests.clear_error();
                SmallVec::new()
            },
        }
    }
}
