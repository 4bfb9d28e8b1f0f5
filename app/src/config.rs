//! Application configuration.
//!
//! Page sizes, resend policy and routing values used by the slices.
//! Values should be provided by the application; the defaults match the
//! production backend.

use std::time::Duration;

use sugoi_client::models::ResendData;

/// Slice configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Page size of catalog listings.
    ///
    /// Default: 20
    pub catalog_page_size: u32,

    /// Page size of the view-all grid.
    ///
    /// Default: 24
    pub view_all_page_size: u32,

    /// Page size of search results.
    ///
    /// Default: 20
    pub search_page_size: u32,

    /// Number of search suggestions.
    ///
    /// Default: 4
    pub suggestion_count: u32,

    /// Recent searches kept.
    ///
    /// Default: 5
    pub recent_search_capacity: usize,

    /// Resends assumed available before the backend reports a quota.
    ///
    /// Default: 3
    pub default_resend_attempts: u32,

    /// Quota assumed when a resend succeeds without one.
    ///
    /// Default: 2 attempts, 60 s
    pub fallback_resend: ResendData,

    /// Length of a resend quota window.
    ///
    /// Default: 6 hours
    pub rate_limit_window: chrono::Duration,

    /// Interval of the cooldown countdown.
    ///
    /// Default: 1 second
    pub countdown_tick: Duration,

    /// Route shown after the session expires.
    ///
    /// Default: `/auth/login`
    pub login_route: String,
}

impl AppConfig {
    /// Create configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set catalog page size.
    #[must_use]
    pub const fn with_catalog_page_size(mut self, size: u32) -> Self {
        self.catalog_page_size = size;
        self
    }

    /// Set view-all page size.
    #[must_use]
    pub const fn with_view_all_page_size(mut self, size: u32) -> Self {
        self.view_all_page_size = size;
        self
    }

    /// Set search page size.
    #[must_use]
    pub const fn with_search_page_size(mut self, size: u32) -> Self {
        self.search_page_size = size;
        self
    }

    /// Set suggestion count.
    #[must_use]
    pub const fn with_suggestion_count(mut self, count: u32) -> Self {
        self.suggestion_count = count;
        self
    }

    /// Set recent search capacity.
    #[must_use]
    pub const fn with_recent_search_capacity(mut self, capacity: usize) -> Self {
        self.recent_search_capacity = capacity;
        self
    }

    /// Set the resend quota window.
    #[must_use]
    pub const fn with_rate_limit_window(mut self, window: chrono::Duration) -> Self {
        self.rate_limit_window = window;
        self
    }

    /// Set the countdown tick interval.
    #[must_use]
    pub const fn with_countdown_tick(mut self, tick: Duration) -> Self {
        self.countdown_tick = tick;
        self
    }

    /// Set the login route.
    #[must_use]
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_page_size: 20,
            view_all_page_size: 24,
            search_page_size: 20,
            suggestion_count: 4,
            recent_search_capacity: 5,
            default_resend_attempts: 3,
            fallback_resend: ResendData {
                attempts_left: 2,
                next_resend_available_in: 60,
            },
            rate_limit_window: chrono::Duration::hours(6),
            countdown_tick: Duration::from_secs(1),
            login_route: "/auth/login".to_string(),
        }
    }
}
