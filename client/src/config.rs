//! Client configuration.

/// Environment variable holding the API base URL.
pub const API_URL_ENV: &str = "SUGOI_API_URL";

/// Base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api/v1";

/// Paths whose 401 answers are credential failures, not session expiry.
pub const SESSION_EXEMPT_PATHS: [&str; 2] = ["/auth/login", "/auth/register"];

/// HTTP adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every request path is appended to, without a trailing slash.
    pub base_url: String,

    /// Route the client is sent to when its session expires.
    ///
    /// Default: `/auth/login`
    pub login_route: String,
}

impl ClientConfig {
    /// Create configuration for `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            login_route: "/auth/login".to_string(),
        }
    }

    /// Read the base URL from `SUGOI_API_URL`, falling back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(API_URL_ENV).map_or_else(|_| Self::default(), Self::new)
    }

    /// Set the login route used for session-expiry redirects.
    #[must_use]
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    /// Full URL of an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}
