//! Failure classification
//!
//! The backend reports business-rule failures only as free-text `message`
//! fields. This module is the one place that inspects that text; every caller
//! branches on [`FailureKind`] instead.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ApiError;

static RETRY_AFTER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(\d+)h\s(\d+)m"));

/// What a failed request means to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Session token rejected
    Unauthorized,
    /// Resource missing; on a paginated request this means end-of-list
    NotFound,
    /// Account exists but its email has not been verified
    PendingVerification,
    /// Login with an unknown email
    EmailNotRegistered,
    /// Login with a wrong password
    IncorrectPassword,
    /// Quota exhausted (OTP resends)
    RateLimited {
        /// Wait time embedded in the message, if any
        retry_after: Option<RetryAfter>,
    },
    /// No response from the backend
    Network,
    /// Anything else
    Other,
}

impl FailureKind {
    /// Whether a paginated caller should treat this failure as end-of-list
    #[must_use]
    pub const fn is_end_of_list(self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Wait time parsed from a `"<H>h <M>m"` fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAfter {
    /// Whole hours
    pub hours: u32,
    /// Remaining minutes
    pub minutes: u32,
}

impl RetryAfter {
    /// Total wait as a duration
    #[must_use]
    pub fn as_duration(self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.hours)) + chrono::Duration::minutes(i64::from(self.minutes))
    }
}

impl fmt::Display for RetryAfter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

/// Classify a client error
#[must_use]
pub fn classify(error: &ApiError) -> FailureKind {
    match error {
        ApiError::Network(_) => FailureKind::Network,
        ApiError::Unauthorized { message } => match message.as_deref().map(classify_text) {
            // Login answers 401 for business-rule failures too
            Some(kind @ (FailureKind::EmailNotRegistered
            | FailureKind::IncorrectPassword
            | FailureKind::PendingVerification)) => kind,
            _ => FailureKind::Unauthorized,
        },
        ApiError::Status { status, message } => {
            let by_text = message.as_deref().map_or(FailureKind::Other, classify_text);
            match (status, by_text) {
                (_, kind) if kind != FailureKind::Other => kind,
                (404, _) => FailureKind::NotFound,
                (429, _) => FailureKind::RateLimited { retry_after: None },
                _ => FailureKind::Other,
            }
        },
        ApiError::Decode(message) => classify_text(message),
    }
}

/// Classify a bare backend message
#[must_use]
pub fn classify_text(message: &str) -> FailureKind {
    if message.contains("verify your email") || message.contains("activate your account") {
        FailureKind::PendingVerification
    } else if message.contains("Email not registered") {
        FailureKind::EmailNotRegistered
    } else if message.contains("Incorrect password") {
        FailureKind::IncorrectPassword
    } else if message.contains("wait") || message.contains("limit reached") {
        FailureKind::RateLimited {
            retry_after: parse_retry_after(message),
        }
    } else if message.contains("404") || message.to_lowercase().contains("not found") {
        FailureKind::NotFound
    } else {
        FailureKind::Other
    }
}

/// Extract the first `"<H>h <M>m"` fragment of a message
#[must_use]
pub fn parse_retry_after(message: &str) -> Option<RetryAfter> {
    let regex = RETRY_AFTER.as_ref().ok()?;
    let captures = regex.captures(message)?;
    Some(RetryAfter {
        hours: captures.get(1)?.as_str().parse().ok()?,
        minutes: captures.get(2)?.as_str().parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16, message: &str) -> ApiError {
        ApiError::Status {
            status,
            message: Some(message.to_string()),
        }
    }

    #[test]
    fn test_unauthorized_without_message() {
        assert_eq!(classify(&ApiError::Unauthorized { message: None }), FailureKind::Unauthorized);
        assert_eq!(
            classify(&ApiError::Unauthorized {
                message: Some("Token expired".to_string())
            }),
            FailureKind::Unauthorized
        );
    }

    #[test]
    fn test_login_failures_carried_by_401() {
        let error = ApiError::Unauthorized {
            message: Some("Incorrect password".to_string()),
        };
        assert_eq!(classify(&error), FailureKind::IncorrectPassword);
    }

    #[test]
    fn test_not_found_by_status_and_text() {
        assert_eq!(
            classify(&ApiError::Status { status: 404, message: None }),
            FailureKind::NotFound
        );
        assert_eq!(classify(&status(400, "Page not found")), FailureKind::NotFound);
        assert_eq!(classify(&status(500, "upstream returned 404")), FailureKind::NotFound);
        assert!(classify(&status(404, "Not Found")).is_end_of_list());
    }

    #[test]
    fn test_pending_verification() {
        assert_eq!(
            classify(&status(403, "Please verify your email before logging in")),
            FailureKind::PendingVerification
        );
        assert_eq!(
            classify_text("You must activate your account first"),
            FailureKind::PendingVerification
        );
    }

    #[test]
    fn test_login_field_errors() {
        assert_eq!(classify(&status(400, "Email not registered")), FailureKind::EmailNotRegistered);
        assert_eq!(classify(&status(400, "Incorrect password")), FailureKind::IncorrectPassword);
    }

    #[test]
    fn test_rate_limited_with_duration() {
        let kind = classify(&status(429, "Maximum resend limit reached. Try again in 5h 42m"));
        assert_eq!(
            kind,
            FailureKind::RateLimited {
                retry_after: Some(RetryAfter { hours: 5, minutes: 42 })
            }
        );
    }

    #[test]
    fn test_rate_limited_without_duration() {
        assert_eq!(
            classify(&status(400, "Please wait before requesting another code")),
            FailureKind::RateLimited { retry_after: None }
        );
        assert_eq!(
            classify(&ApiError::Status { status: 429, message: None }),
            FailureKind::RateLimited { retry_after: None }
        );
    }

    #[test]
    fn test_network_and_other() {
        assert_eq!(classify(&ApiError::Network("timeout".to_string())), FailureKind::Network);
        assert_eq!(classify(&status(500, "Internal server error")), FailureKind::Other);
        assert_eq!(classify(&ApiError::Status { status: 500, message: None }), FailureKind::Other);
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("in 0h 5m"), Some(RetryAfter { hours: 0, minutes: 5 }));
        assert_eq!(parse_retry_after("in 5h"), None);
        assert_eq!(parse_retry_after("in 5h  3m"), None);

        let parsed = parse_retry_after("try again in 2h 30m");
        assert_eq!(parsed.map(RetryAfter::as_duration), Some(chrono::Duration::minutes(150)));
        assert_eq!(parsed.map(|r| r.to_string()).as_deref(), Some("2h 30m"));
    }
}
