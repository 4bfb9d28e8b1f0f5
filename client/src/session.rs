//! Typed access to durable client state.
//!
//! [`SessionStore`] is the only code that knows storage key names. The HTTP
//! adapter reads the token through it; slices read and write their own keys.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::storage::{MemoryStorage, Storage};

/// Storage keys
pub mod keys {
    /// Bearer token
    pub const TOKEN: &str = "token";
    /// `light` / `dark`
    pub const THEME_MODE: &str = "themeMode";
    /// JSON array of recent queries
    pub const RECENT_SEARCHES: &str = "recentSearches";
    /// Address the OTP flow is running for
    pub const OTP_EMAIL: &str = "otpEmail";
    /// Epoch ms when the next resend becomes available
    pub const OTP_COOLDOWN_END: &str = "otpCooldownEnd";
    /// Resends left in the current window
    pub const OTP_ATTEMPTS_LEFT: &str = "otpAttemptsLeft";
    /// Epoch ms when the resend quota window closes
    pub const OTP_RATE_LIMIT_END: &str = "otpRateLimitEnd";
    /// Address of an account that tried to log in before verifying
    pub const PENDING_VERIFICATION_EMAIL: &str = "pendingVerificationEmail";

    /// Every OTP key
    pub const OTP_KEYS: [&str; 4] = [OTP_EMAIL, OTP_COOLDOWN_END, OTP_ATTEMPTS_LEFT, OTP_RATE_LIMIT_END];
}

/// Colour scheme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light scheme
    #[default]
    Light,
    /// Dark scheme
    Dark,
}

impl ThemeMode {
    /// The other mode
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme mode: {other}")),
        }
    }
}

/// Persisted OTP resend state
///
/// Read back on remount to rebuild a live countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendCooldownRecord {
    /// Address the record belongs to
    pub email: String,
    /// When the next resend becomes available
    pub cooldown_end: Option<DateTime<Utc>>,
    /// Resends left in the current window
    pub attempts_left: Option<u32>,
    /// When the quota window closes
    pub rate_limit_end: Option<DateTime<Utc>>,
}

/// Handle over durable client storage. Clones share the backend.
#[derive(Debug, Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    /// Wrap a storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Session store over fresh in-memory storage.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    // Token

    /// Current bearer token.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read.
    pub fn token(&self) -> StorageResult<Option<String>> {
        self.storage.get(keys::TOKEN)
    }

    /// Store the bearer token.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    pub fn set_token(&self, token: &str) -> StorageResult<()> {
        self.storage.set(keys::TOKEN, token)
    }

    /// Purge the bearer token.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    pub fn clear_token(&self) -> StorageResult<()> {
        self.storage.remove(keys::TOKEN)
    }

    // Theme

    /// Stored theme, `None` if unset or unrecognised.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read.
    pub fn theme(&self) -> StorageResult<Option<ThemeMode>> {
        Ok(self.storage.get(keys::THEME_MODE)?.and_then(|v| v.parse().ok()))
    }

    /// Persist the theme.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    pub fn set_theme(&self, mode: ThemeMode) -> StorageResult<()> {
        self.storage.set(keys::THEME_MODE, mode.as_str())
    }

    // Recent searches

    /// Stored recent searches, most recent first.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read or the value is not a JSON array.
    pub fn recent_searches(&self) -> StorageResult<Vec<String>> {
        match self.storage.get(keys::RECENT_SEARCHES)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Persist recent searches.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    pub fn set_recent_searches(&self, searches: &[String]) -> StorageResult<()> {
        self.storage.set(keys::RECENT_SEARCHES, &serde_json::to_string(searches)?)
    }

    /// Drop recent searches.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    pub fn clear_recent_searches(&self) -> StorageResult<()> {
        self.storage.remove(keys::RECENT_SEARCHES)
    }

    // OTP resend cooldown

    /// Persisted resend record, `None` if no OTP flow is stored.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read.
    pub fn resend_cooldown(&self) -> StorageResult<Option<ResendCooldownRecord>> {
        let Some(email) = self.storage.get(keys::OTP_EMAIL)? else {
            return Ok(None);
        };

        Ok(Some(ResendCooldownRecord {
            email,
            cooldown_end: self.timestamp(keys::OTP_COOLDOWN_END)?,
            attempts_left: self.storage.get(keys::OTP_ATTEMPTS_LEFT)?.and_then(|v| v.parse().ok()),
            rate_limit_end: self.timestamp(keys::OTP_RATE_LIMIT_END)?,
        }))
    }

    /// Persist a resend record. Unset fields remove their key.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    pub fn save_resend_cooldown(&self, record: &ResendCooldownRecord) -> StorageResult<()> {
        self.storage.set(keys::OTP_EMAIL, &record.email)?;
        self.set_timestamp(keys::OTP_COOLDOWN_END, record.cooldown_end)?;
        match record.attempts_left {
            Some(attempts) => self.storage.set(keys::OTP_ATTEMPTS_LEFT, &attempts.to_string())?,
            None => self.storage.remove(keys::OTP_ATTEMPTS_LEFT)?,
        }
        self.set_timestamp(keys::OTP_RATE_LIMIT_END, record.rate_limit_end)
    }

    /// Drop only the cooldown deadline; the quota record stays.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    pub fn clear_resend_cooldown(&self) -> StorageResult<()> {
        self.storage.remove(keys::OTP_COOLDOWN_END)
    }

    /// Drop every OTP key.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    pub fn clear_otp(&self) -> StorageResult<()> {
        for key in keys::OTP_KEYS {
            self.storage.remove(key)?;
        }
        Ok(())
    }

    // Pending verification

    /// Address awaiting verification after a refused login.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be read.
    pub fn pending_verification_email(&self) -> StorageResult<Option<String>> {
        self.storage.get(keys::PENDING_VERIFICATION_EMAIL)
    }

    /// Remember an address awaiting verification.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    pub fn set_pending_verification_email(&self, email: &str) -> StorageResult<()> {
        self.storage.set(keys::PENDING_VERIFICATION_EMAIL, email)
    }

    /// Forget the pending verification address.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    pub fn clear_pending_verification_email(&self) -> StorageResult<()> {
        self.storage.remove(keys::PENDING_VERIFICATION_EMAIL)
    }

    fn timestamp(&self, key: &str) -> StorageResult<Option<DateTime<Utc>>> {
        Ok(self
            .storage
            .get(key)?
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis))
    }

    fn set_timestamp(&self, key: &str, value: Option<DateTime<Utc>>) -> StorageResult<()> {
        match value {
            Some(at) => self.storage.set(key, &at.timestamp_millis().to_string()),
            None => self.storage.remove(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(ms)
    }

    #[test]
    fn test_token_lifecycle() -> StorageResult<()> {
        let session = SessionStore::in_memory();
        assert_eq!(session.token()?, None);

        session.set_token("jwt")?;
        assert_eq!(session.token()?.as_deref(), Some("jwt"));

        session.clear_token()?;
        assert_eq!(session.token()?, None);
        Ok(())
    }

    #[test]
    fn test_resend_record_stored_as_epoch_millis() -> StorageResult<()> {
        let storage = MemoryStorage::new();
        let session = SessionStore::new(Arc::new(storage.clone()));
        let record = ResendCooldownRecord {
            email: "rin@example.com".to_string(),
            cooldown_end: at(1_735_689_660_000),
            attempts_left: Some(2),
            rate_limit_end: at(1_735_711_200_000),
        };

        session.save_resend_cooldown(&record)?;

        assert_eq!(storage.get(keys::OTP_COOLDOWN_END)?.as_deref(), Some("1735689660000"));
        assert_eq!(session.resend_cooldown()?, Some(record));
        Ok(())
    }

    #[test]
    fn test_clear_cooldown_keeps_quota() -> StorageResult<()> {
        let session = SessionStore::in_memory();
        session.save_resend_cooldown(&ResendCooldownRecord {
            email: "rin@example.com".to_string(),
            cooldown_end: at(1_000),
            attempts_left: Some(1),
            rate_limit_end: at(2_000),
        })?;

        session.clear_resend_cooldown()?;
        let record = session.resend_cooldown()?;
        assert_eq!(record.as_ref().and_then(|r| r.cooldown_end), None);
        assert_eq!(record.as_ref().and_then(|r| r.attempts_left), Some(1));

        session.clear_otp()?;
        assert_eq!(session.resend_cooldown()?, None);
        Ok(())
    }

    #[test]
    fn test_recent_searches_json() -> StorageResult<()> {
        let session = SessionStore::in_memory();
        assert!(session.recent_searches()?.is_empty());

        session.set_recent_searches(&["naruto".to_string(), "bleach".to_string()])?;
        assert_eq!(session.recent_searches()?, vec!["naruto", "bleach"]);
        Ok(())
    }

    #[test]
    fn test_theme_parse() -> StorageResult<()> {
        let session = SessionStore::in_memory();
        assert_eq!(session.theme()?, None);
        session.set_theme(ThemeMode::Dark)?;
        assert_eq!(session.theme()?, Some(ThemeMode::Dark));
        assert_eq!(ThemeMode::Dark.toggled(), ThemeMode::Light);
        Ok(())
    }
}
