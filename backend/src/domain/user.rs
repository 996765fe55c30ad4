//! User accounts, subscription tiers and profile data.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Language;

/// Validation errors returned by user primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyEmail,
    InvalidEmail,
    EmailTooLong { max: usize },
    UnknownTier(String),
    UnknownUserType(String),
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must be a valid address"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::UnknownTier(value) => {
                write!(f, "subscription tier must be free, premium or pro (got {value})")
            }
            Self::UnknownUserType(value) => {
                write!(f, "user type must be farmer, consumer or both (got {value})")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Maximum accepted email length.
pub const EMAIL_MAX: usize = 254;

/// Normalised (trimmed, lower-cased) email address.
///
/// # Examples
/// ```
/// use farmwise::domain::Email;
///
/// let email = Email::new("  Grower@Example.COM ").unwrap();
/// assert_eq!(email.as_ref(), "grower@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and normalise an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if normalised.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }

        let Some((local, domain)) = normalised.split_once('@') else {
            return Err(UserValidationError::InvalidEmail);
        };
        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains('@');
        if local.is_empty() || !domain_ok || normalised.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }

        Ok(Self(normalised))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Subscription level gating feature access and AI usage quota.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Premium,
    Pro,
}

impl SubscriptionTier {
    /// Storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
            Self::Pro => "pro",
        }
    }

    /// Paid tiers lift the prompt quota and unlock analytics.
    pub const fn is_paid(self) -> bool {
        matches!(self, Self::Premium | Self::Pro)
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "premium" => Ok(Self::Premium),
            "pro" => Ok(Self::Pro),
            _ => Err(UserValidationError::UnknownTier(s.to_owned())),
        }
    }
}

/// Which side of the food system a user participates in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Farmer,
    Consumer,
    Both,
}

impl UserType {
    /// Storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Farmer => "farmer",
            Self::Consumer => "consumer",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "farmer" => Ok(Self::Farmer),
            "consumer" => Ok(Self::Consumer),
            "both" => Ok(Self::Both),
            _ => Err(UserValidationError::UnknownUserType(s.to_owned())),
        }
    }
}

/// Self-declared profile information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Display name, at most 128 characters.
    pub name: Option<String>,
    pub user_type: UserType,
    /// Drives regional crop and climate content.
    pub region: Option<String>,
    #[schema(value_type = String, example = "english")]
    pub preferred_language: Language,
}

/// Badge earned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    /// Badge display name; the uniqueness key under the once-per-badge policy.
    pub badge: String,
    pub description: String,
    pub points: u32,
    pub earned_at: DateTime<Utc>,
}

/// Stored user account.
///
/// ## Invariants
/// - `prompts_used` only gates chat when `tier` is [`SubscriptionTier::Free`].
/// - `sustainability_score` never exceeds 100.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub email: Email,
    /// bcrypt hash; never serialised.
    pub password_hash: String,
    pub tier: SubscriptionTier,
    /// Chats counted against the free quota since the last tier change.
    pub prompts_used: u32,
    pub total_points: u32,
    pub sustainability_score: u8,
    pub profile: UserProfile,
    /// Reference of the last applied payment.
    pub subscription_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data required to create an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserAccount {
    pub id: UserId,
    pub email: Email,
    pub password_hash: String,
    pub profile: UserProfile,
}

impl NewUserAccount {
    /// Materialise the account with its default counters, as stored on insert.
    pub fn into_account(self, created_at: DateTime<Utc>) -> UserAccount {
        UserAccount {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            tier: SubscriptionTier::Free,
            prompts_used: 0,
            total_points: 0,
            sustainability_score: 0,
            profile: self.profile,
            subscription_reference: None,
            created_at,
        }
    }
}
