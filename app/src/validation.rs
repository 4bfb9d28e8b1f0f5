//! Client-side form validation
//!
//! Failures are reported per field and never reach the network.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static EMAIL: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));

static PASSWORD_CHARS: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\d@$!%*?&]{8,}$"));

/// Form field a validation error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Display name
    Name,
    /// Email address
    Email,
    /// Password or new password
    Password,
    /// Current password when changing it
    CurrentPassword,
    /// Password confirmation
    ConfirmPassword,
    /// Terms checkbox
    AgreeToTerms,
    /// OTP code
    VerificationCode,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Password => "password",
            Self::CurrentPassword => "currentPassword",
            Self::ConfirmPassword => "confirmPassword",
            Self::AgreeToTerms => "agreeToTerms",
            Self::VerificationCode => "verificationCode",
        };
        f.write_str(name)
    }
}

/// Per-field messages
pub type FieldErrors = BTreeMap<Field, String>;

/// A single failed check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Blank name
    #[error("Name is required")]
    NameRequired,
    /// Name under 2 characters
    #[error("Name must be at least 2 characters long")]
    NameTooShort,
    /// Blank email
    #[error("Email is required")]
    EmailRequired,
    /// Email without `local@domain.tld` shape
    #[error("Please enter a valid email address")]
    InvalidEmail,
    /// Blank password
    #[error("Password is required")]
    PasswordRequired,
    /// Password too short, or missing a lowercase, uppercase or digit
    #[error("Password must be at least 8 characters long with uppercase, lowercase, and number")]
    WeakPassword,
    /// Password under 8 characters
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,
    /// Blank confirmation
    #[error("Please confirm your password")]
    ConfirmationRequired,
    /// Confirmation differs
    #[error("Passwords do not match")]
    PasswordMismatch,
    /// Terms unchecked
    #[error("You must agree to the terms and conditions")]
    TermsNotAccepted,
    /// Blank code
    #[error("Please enter the verification code")]
    CodeRequired,
    /// Code not exactly six digits
    #[error("Verification code must be 6 digits")]
    InvalidCode,
}

/// Check an email address
///
/// # Errors
///
/// [`ValidationError::EmailRequired`] or [`ValidationError::InvalidEmail`].
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    let valid = EMAIL.as_ref().is_ok_and(|re| re.is_match(email));
    if valid { Ok(()) } else { Err(ValidationError::InvalidEmail) }
}

/// Check a new password: 8+ allowed characters with a lowercase letter, an
/// uppercase letter and a digit
///
/// # Errors
///
/// [`ValidationError::PasswordRequired`] or [`ValidationError::WeakPassword`].
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    let allowed = PASSWORD_CHARS.as_ref().is_ok_and(|re| re.is_match(password));
    let mixed = password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit());
    if allowed && mixed { Ok(()) } else { Err(ValidationError::WeakPassword) }
}

/// Check a display name
///
/// # Errors
///
/// [`ValidationError::NameRequired`] or [`ValidationError::NameTooShort`].
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        Err(ValidationError::NameRequired)
    } else if name.chars().count() < 2 {
        Err(ValidationError::NameTooShort)
    } else {
        Ok(())
    }
}

/// Check that the confirmation repeats the password
///
/// # Errors
///
/// [`ValidationError::PasswordMismatch`].
pub fn validate_confirmation(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password == confirmation { Ok(()) } else { Err(ValidationError::PasswordMismatch) }
}

/// Check the terms checkbox
///
/// # Errors
///
/// [`ValidationError::TermsNotAccepted`].
pub const fn validate_terms(agreed: bool) -> Result<(), ValidationError> {
    if agreed { Ok(()) } else { Err(ValidationError::TermsNotAccepted) }
}

/// Check an OTP code: exactly six ASCII digits
///
/// # Errors
///
/// [`ValidationError::CodeRequired`] or [`ValidationError::InvalidCode`].
pub fn validate_code(code: &str) -> Result<(), ValidationError> {
    let code = code.trim();
    if code.is_empty() {
        Err(ValidationError::CodeRequired)
    } else if code.len() == 6 && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCode)
    }
}

/// Collects field errors, keeping the first failure per field
#[derive(Debug, Default)]
struct Checks {
    errors: FieldErrors,
}

impl Checks {
    fn check(mut self, field: Field, result: Result<(), ValidationError>) -> Self {
        if let Err(e) = result {
            self.errors.entry(field).or_insert_with(|| e.to_string());
        }
        self
    }

    fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() { Ok(()) } else { Err(self.errors) }
    }
}

/// Sign-up form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegistrationForm {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
    /// Password again
    pub confirm_password: String,
    /// Terms accepted
    pub agree_to_terms: bool,
}

impl RegistrationForm {
    /// Validate every field
    ///
    /// # Errors
    ///
    /// One message per invalid field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        Checks::default()
            .check(Field::Name, validate_name(&self.name))
            .check(Field::Email, validate_email(&self.email))
            .check(Field::Password, validate_password(&self.password))
            .check(
                Field::ConfirmPassword,
                validate_confirmation(&self.password, &self.confirm_password),
            )
            .check(Field::AgreeToTerms, validate_terms(self.agree_to_terms))
            .finish()
    }
}

/// Sign-in form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginForm {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

impl LoginForm {
    /// Validate every field; the password is only required, not graded
    ///
    /// # Errors
    ///
    /// One message per invalid field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let password = if self.password.is_empty() {
            Err(ValidationError::PasswordRequired)
        } else {
            Ok(())
        };
        Checks::default()
            .check(Field::Email, validate_email(&self.email))
            .check(Field::Password, password)
            .finish()
    }
}

/// Password reset form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResetPasswordForm {
    /// New password
    pub password: String,
    /// New password again
    pub confirm_password: String,
}

impl ResetPasswordForm {
    /// Validate every field
    ///
    /// # Errors
    ///
    /// One message per invalid field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let password = match self.password.chars().count() {
            0 => Err(ValidationError::PasswordRequired),
            n if n < 8 => Err(ValidationError::PasswordTooShort),
            _ => Ok(()),
        };
        let confirmation = if self.confirm_password.is_empty() {
            Err(ValidationError::ConfirmationRequired)
        } else {
            validate_confirmation(&self.password, &self.confirm_password)
        };
        Checks::default()
            .check(Field::Password, password)
            .check(Field::ConfirmPassword, confirmation)
            .finish()
    }
}

/// Password change form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangePasswordForm {
    /// Current password
    pub current_password: String,
    /// New password
    pub new_password: String,
    /// New password again
    pub confirm_password: String,
}

impl ChangePasswordForm {
    /// Validate every field
    ///
    /// # Errors
    ///
    /// One message per invalid field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let current = if self.current_password.is_empty() {
            Err(ValidationError::PasswordRequired)
        } else {
            Ok(())
        };
        Checks::default()
            .check(Field::CurrentPassword, current)
            .check(Field::Password, validate_password(&self.new_password))
            .check(
                Field::ConfirmPassword,
                validate_confirmation(&self.new_password, &self.confirm_password),
            )
            .finish()
    }
}
