//! OTP resend cooldown state machine.
//!
//! ```text
//! Idle ──Resend──▶ Sending ──ok──▶ CooldownActive ──countdown 0──▶ Idle
//!                     │                                  └─(no attempts)──▶ RateLimited
//!                     └──quota error──▶ RateLimited
//! ```
//!
//! The countdown is not a timer handle. Every tick recomputes
//! [`cooldown_seconds_remaining`] from the clock and the persisted deadline,
//! and re-arms itself with an `Effect::Delay`. Ticks carry the epoch of the
//! countdown that scheduled them; starting a new countdown bumps the epoch,
//! so ticks of a superseded chain are ignored and die out.
//!
//! The resend record (email, cooldown deadline, attempts left, quota window
//! end) is persisted through [`SessionStore`](sugoi_client::SessionStore)
//! and read back by [`VerificationAction::Restore`] after a reload.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use sugoi_client::models::ResendData;
use sugoi_client::{classify, ApiError, FailureKind, ResendCooldownRecord, SugoiApi};
use sugoi_core::effect::Effect;
use sugoi_core::reducer::Reducer;
use sugoi_core::{smallvec, SmallVec};

use crate::environment::AppEnvironment;
use crate::slices::{persist, restore};

/// Resends assumed available before the backend reports a quota
pub const DEFAULT_RESEND_ATTEMPTS: u32 = 3;

/// Message for a failed resend without a server message
pub const RESEND_FAILED: &str = "Failed to resend verification code";

/// Whole seconds until `end`, rounded up; 0 once `end` has passed
#[must_use]
pub fn cooldown_seconds_remaining(now: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    u64::try_from((end - now).num_milliseconds()).map_or(0, |ms| ms.div_ceil(1000))
}

/// `"1 attempt"`, `"2 attempts"`
#[must_use]
pub fn attempts_phrase(count: u32) -> String {
    if count == 1 {
        "1 attempt".to_string()
    } else {
        format!("{count} attempts")
    }
}

/// Human message for a failed resend
///
/// Quota failures with an embedded wait become
/// `"Maximum attempts reached. Try again in 5h 59m."`; anything else keeps the
/// backend's text.
#[must_use]
pub fn resend_failure_notice(error: &ApiError) -> String {
    match classify(error) {
        FailureKind::RateLimited {
            retry_after: Some(wait),
        } => format!("Maximum attempts reached. Try again in {wait}."),
        _ => error.message_or(RESEND_FAILED),
    }
}

/// Resend button state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResendPhase {
    /// Resend allowed
    #[default]
    Idle,
    /// Request in flight
    Sending,
    /// Waiting for the next resend slot
    CooldownActive,
    /// Quota exhausted for the current window
    RateLimited,
}

/// Who asked for the resend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendOrigin {
    /// The resend button
    User,
    /// A login refused for an unverified account
    Login,
}

/// Verification state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationState {
    /// Address the flow runs for
    pub email: Option<String>,
    /// Button state
    pub phase: ResendPhase,
    /// Resends left in the current window
    pub attempts_left: u32,
    /// When the next resend becomes available
    pub cooldown_end: Option<DateTime<Utc>>,
    /// When the quota window closes
    pub rate_limit_end: Option<DateTime<Utc>>,
    /// Countdown shown next to the button
    pub cooldown_seconds_remaining: u64,
    /// Message of the last failed resend
    pub notice: Option<String>,
    tick_epoch: u64,
}

impl Default for VerificationState {
    fn default() -> Self {
        Self {
            email: None,
            phase: ResendPhase::Idle,
            attempts_left: DEFAULT_RESEND_ATTEMPTS,
            cooldown_end: None,
            rate_limit_end: None,
            cooldown_seconds_remaining: 0,
            notice: None,
            tick_epoch: 0,
        }
    }
}

impl VerificationState {
    /// Whether a resend may be dispatched now
    #[must_use]
    pub const fn can_resend(&self) -> bool {
        !matches!(self.phase, ResendPhase::Sending | ResendPhase::CooldownActive)
            && self.cooldown_seconds_remaining == 0
    }

    /// Epoch of the live countdown
    #[must_use]
    pub const fn tick_epoch(&self) -> u64 {
        self.tick_epoch
    }

    fn window_active(&self, now: DateTime<Utc>) -> bool {
        self.rate_limit_end.is_some_and(|end| end > now)
    }

    const fn phase_after_cooldown(&self) -> ResendPhase {
        if self.attempts_left == 0 {
            ResendPhase::RateLimited
        } else {
            ResendPhase::Idle
        }
    }

    fn record(&self, email: &str) -> ResendCooldownRecord {
        ResendCooldownRecord {
            email: email.to_string(),
            cooldown_end: self.cooldown_end,
            attempts_left: Some(self.attempts_left),
            rate_limit_end: self.rate_limit_end,
        }
    }
}

/// Verification actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationAction {
    /// Rebuild state for `email` from the persisted record
    Restore {
        /// Address being verified
        email: String,
    },
    /// Ask the backend for a new code
    Resend {
        /// Address being verified
        email: String,
        /// Who asked
        origin: ResendOrigin,
    },
    /// Countdown tick
    Tick {
        /// Countdown the tick belongs to
        epoch: u64,
    },
    /// Verification succeeded; forget the flow
    Completed,

    /// Resend accepted
    ResendSucceeded {
        /// Address the code went to
        email: String,
        /// Who asked
        origin: ResendOrigin,
        /// Quota reported by the backend
        data: Option<ResendData>,
    },
    /// Resend refused
    ResendFailed {
        /// Address the code was for
        email: String,
        /// Who asked
        origin: ResendOrigin,
        /// Cause
        error: ApiError,
    },
}

/// Verification reducer
#[derive(Debug, Clone)]
pub struct VerificationReducer<Api> {
    _phantom: PhantomData<fn() -> Api>,
}

impl<Api> VerificationReducer<Api> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<Api> Default for VerificationReducer<Api> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Api: SugoiApi> VerificationReducer<Api> {
    /// Start a countdown towards `state.cooldown_end`, superseding any other
    fn start_countdown(
        state: &mut VerificationState,
        env: &AppEnvironment<Api>,
    ) -> SmallVec<[Effect<VerificationAction>; 4]> {
        state.tick_epoch += 1;
        state.cooldown_seconds_remaining = state
            .cooldown_end
            .map_or(0, |end| cooldown_seconds_remaining(env.now(), end));

        if state.cooldown_seconds_remaining == 0 {
            state.cooldown_end = None;
            state.phase = state.phase_after_cooldown();
            return SmallVec::new();
        }

        state.phase = ResendPhase::CooldownActive;
        smallvec![Effect::delay(
            env.config.countdown_tick,
            VerificationAction::Tick {
                epoch: state.tick_epoch,
            },
        )]
    }

    fn save(state: &VerificationState, email: &str, env: &AppEnvironment<Api>) {
        persist("resend cooldown", env.session.save_resend_cooldown(&state.record(email)));
    }
}

impl<Api: SugoiApi> Reducer for VerificationReducer<Api> {
    type State = VerificationState;
    type Action = VerificationAction;
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
            // Restore: rebuild from the persisted record after a reload
            // ═══════════════════════════════════════════════════════════════
            VerificationAction::Restore { email } => {
                let now = env.now();
                let record = restore("resend cooldown", env.session.resend_cooldown())
                    .filter(|record| record.email == email);

                *state = VerificationState {
                    email: Some(email),
                    attempts_left: env.config.default_resend_attempts,
                    tick_epoch: state.tick_epoch,
                    ..VerificationState::default()
                };

                let Some(record) = record else {
                    state.tick_epoch += 1;
                    return SmallVec::new();
                };

                if record.rate_limit_end.is_some_and(|end| end > now) {
                    state.rate_limit_end = record.rate_limit_end;
                    if let Some(attempts) = record.attempts_left {
                        state.attempts_left = attempts;
                    }
                } else if record.rate_limit_end.is_some() {
                    tracing::debug!("Resend quota window passed");
                    persist("resend cooldown", env.session.clear_otp());
                }

                state.cooldown_end = record.cooldown_end.filter(|end| *end > now);
                Self::start_countdown(state, env)
            },

            // ═══════════════════════════════════════════════════════════════
            // Resend: guarded while sending or cooling down
            // ═══════════════════════════════════════════════════════════════
            VerificationAction::Resend { email, origin } => {
                if !state.can_resend() {
                    tracing::debug!(
                        phase = ?state.phase,
                        remaining = state.cooldown_seconds_remaining,
                        "Resend ignored"
                    );
                    return SmallVec::new();
                }

                state.phase = ResendPhase::Sending;
                state.email = Some(email.clone());
                state.notice = None;

                let api = env.api.clone();
                smallvec![Effect::future(async move {
                    Some(match api.resend_verification(&email).await {
                        Ok(data) => VerificationAction::ResendSucceeded {
                            email,
                            origin,
                            data,
                        },
                        Err(error) => VerificationAction::ResendFailed {
                            email,
                            origin,
                            error,
                        },
                    })
                })]
            },

            VerificationAction::ResendSucceeded { email, data, .. } => {
                let for_current = state.email.as_deref() == Some(email.as_str());
                if state.phase != ResendPhase::Sending || !for_current {
                    return SmallVec::new();
                }

                let data = data.unwrap_or(env.config.fallback_resend);
                let now = env.now();

                // Attempts only go down while the previous window is open
                state.attempts_left = if state.window_active(now) {
                    state.attempts_left.min(data.attempts_left)
                } else {
                    data.attempts_left
                };
                state.rate_limit_end = Some(now + env.config.rate_limit_window);

                let cooldown = i64::try_from(data.next_resend_available_in).unwrap_or(i64::MAX);
                state.cooldown_end = Some(now + chrono::Duration::seconds(cooldown));

                Self::save(state, &email, env);
                Self::start_countdown(state, env)
            },

            VerificationAction::ResendFailed { email, error, .. } => {
                if state.phase != ResendPhase::Sending {
                    return SmallVec::new();
                }

                state.notice = Some(resend_failure_notice(&error));

                if let FailureKind::RateLimited { retry_after } = classify(&error) {
                    state.phase = ResendPhase::RateLimited;
                    state.attempts_left = 0;
                    let wait = retry_after
                        .map_or(env.config.rate_limit_window, |wait| wait.as_duration());
                    state.rate_limit_end = Some(env.now() + wait);
                    Self::save(state, &email, env);
                } else {
                    state.phase = ResendPhase::Idle;
                }
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════════
            // Tick: recompute from the clock, re-arm until zero
            // ═══════════════════════════════════════════════════════════════
            VerificationAction::Tick { epoch } => {
                if epoch != state.tick_epoch || state.phase != ResendPhase::CooldownActive {
                    return SmallVec::new();
                }

                state.cooldown_seconds_remaining = state
                    .cooldown_end
                    .map_or(0, |end| cooldown_seconds_remaining(env.now(), end));

                if state.cooldown_seconds_remaining > 0 {
                    return smallvec![Effect::delay(
                        env.config.countdown_tick,
                        VerificationAction::Tick { epoch },
                    )];
                }

                state.cooldown_end = None;
                state.phase = state.phase_after_cooldown();
                persist("resend cooldown", env.session.clear_resend_cooldown());
                SmallVec::new()
            },

            VerificationAction::Completed => {
                persist("resend cooldown", env.session.clear_otp());
                persist(
                    "pending verification email",
                    env.session.clear_pending_verification_email(),
                );
                *state = VerificationState {
                    tick_epoch: state.tick_epoch + 1,
                    ..VerificationState::default()
                };
                SmallVec::new()
            },
        }
    }
}
