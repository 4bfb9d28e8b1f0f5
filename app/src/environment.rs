//! Application environment.
//!
//! This module defines the environment type for dependency injection
//! in slice reducers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sugoi_client::{SessionStore, SugoiApi};
use sugoi_core::environment::{Clock, SystemClock};

use crate::config::AppConfig;

/// Application environment.
///
/// Contains all external dependencies needed by slice reducers.
///
/// # Type Parameters
///
/// - `Api`: Backend endpoints ([`ApiClient`](sugoi_client::ApiClient) in
///   production, [`MockApi`](sugoi_client::mocks::MockApi) in tests)
#[derive(Clone)]
pub struct AppEnvironment<Api>
where
    Api: SugoiApi,
{
    /// Backend endpoints.
    pub api: Api,

    /// Durable client state (token, theme, recent searches, OTP record).
    pub session: SessionStore,

    /// Time source for cooldowns and rate-limit windows.
    pub clock: Arc<dyn Clock>,

    /// Page sizes and resend policy.
    pub config: AppConfig,
}

impl<Api> AppEnvironment<Api>
where
    Api: SugoiApi,
{
    /// Create an environment on the system clock with default configuration.
    #[must_use]
    pub fn new(api: Api, session: SessionStore) -> Self {
        Self {
            api,
            session,
            clock: Arc::new(SystemClock),
            config: AppConfig::default(),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Current time.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl<Api> std::fmt::Debug for AppEnvironment<Api>
where
    Api: SugoiApi,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppEnvironment")
            .field("session", &self.session)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
