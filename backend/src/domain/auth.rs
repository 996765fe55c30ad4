//! Authentication primitives: registration payloads and login credentials.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use zeroize::Zeroizing;

use super::chat::LANGUAGE_MAX;
use super::{Email, UserProfile, UserValidationError};

/// Minimum accepted password length for new accounts.
pub const PASSWORD_MIN: usize = 6;

/// Upper bound on the display name and region, matching their columns.
pub const PROFILE_TEXT_MAX: usize = 128;

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was missing or malformed.
    Email(UserValidationError),
    /// Password was blank.
    EmptyPassword,
    /// Password was shorter than [`PASSWORD_MIN`].
    PasswordTooShort { min: usize },
    /// A profile field exceeded its stored width.
    ProfileFieldTooLong { field: &'static str, max: usize },
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(err) => err.fmt(f),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::ProfileFieldTooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

impl From<UserValidationError> for CredentialsValidationError {
    fn from(value: UserValidationError) -> Self {
        Self::Email(value)
    }
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is normalised by [`Email::new`].
/// - `password` is non-empty and retains caller-provided whitespace to avoid
///   surprising credential comparisons.
///
/// # Examples
/// ```
/// use farmwise::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@Example.com", "secret").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// assert_eq!(creds.password(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised login email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password exactly as supplied by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    email: Email,
    password: Zeroizing<String>,
    profile: UserProfile,
}

impl Registration {
    /// Validate the email, enforce the minimum password length and bound the
    /// profile fields.
    pub fn try_new(
        email: &str,
        password: &str,
        profile: UserProfile,
    ) -> Result<Self, CredentialsValidationError> {
        let email = Email::new(email)?;
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        if password.chars().count() < PASSWORD_MIN {
            return Err(CredentialsValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        check_profile(&profile)?;

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
            profile,
        })
    }

    /// Normalised account email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Plain password awaiting hashing.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Profile stored with the new account.
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }
}

fn check_profile(profile: &UserProfile) -> Result<(), CredentialsValidationError> {
    let too_long = |value: Option<&str>, max: usize| value.is_some_and(|v| v.chars().count() > max);
    if too_long(profile.name.as_deref(), PROFILE_TEXT_MAX) {
        return Err(CredentialsValidationError::ProfileFieldTooLong {
            field: "name",
            max: PROFILE_TEXT_MAX,
        });
    }
    if too_long(profile.region.as_deref(), PROFILE_TEXT_MAX) {
        return Err(CredentialsValidationError::ProfileFieldTooLong {
            field: "region",
            max: PROFILE_TEXT_MAX,
        });
    }
    if !profile.preferred_language.fits_column() {
        return Err(CredentialsValidationError::ProfileFieldTooLong {
            field: "preferredLanguage",
            max: LANGUAGE_MAX,
        });
    }
    Ok(())
}

/// Signed bearer token returned on login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap an already signed token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<AccessToken> for String {
    fn from(value: AccessToken) -> Self {
        value.0
    }
}
