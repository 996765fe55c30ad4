//! Chat exchanges with the advisory model and their session grouping.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Number of prompts a free-tier account may send in total.
pub const FREE_PROMPT_LIMIT: u32 = 5;

/// Upper bound on a single chat message.
pub const MESSAGE_MAX: usize = 4_000;

/// Upper bound on a client-generated session identifier.
pub const SESSION_ID_MAX: usize = 128;

/// Upper bound on a language name, matching the stored column width.
pub const LANGUAGE_MAX: usize = 64;

/// Validation errors for chat inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatValidationError {
    EmptySessionId,
    SessionIdTooLong { max: usize },
    EmptyMessage,
    MessageTooLong { max: usize },
    LanguageTooLong { max: usize },
}

impl fmt::Display for ChatValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySessionId => write!(f, "sessionId must not be empty"),
            Self::SessionIdTooLong { max } => {
                write!(f, "sessionId must be at most {max} characters")
            }
            Self::EmptyMessage => write!(f, "message must not be empty"),
            Self::MessageTooLong { max } => write!(f, "message must be at most {max} characters"),
            Self::LanguageTooLong { max } => {
                write!(f, "language must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for ChatValidationError {}

/// Client-generated key grouping messages into one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Trim and bound a client-supplied session key.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ChatValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ChatValidationError::EmptySessionId);
        }
        if trimmed.chars().count() > SESSION_ID_MAX {
            return Err(ChatValidationError::SessionIdTooLong {
                max: SESSION_ID_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<SessionId> for String {
    fn from(value: SessionId) -> Self {
        value.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = ChatValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Response language requested by the client.
///
/// Stored lower-cased; blank input falls back to English.
///
/// # Examples
/// ```
/// use farmwise::domain::Language;
///
/// assert!(Language::new(" English ").is_english());
/// assert!(!Language::new("Swahili").is_english());
/// assert_eq!(Language::new("").as_ref(), "english");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Language(String);

impl Language {
    /// The only language open to the free tier.
    pub const ENGLISH: &'static str = "english";

    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            Self::default()
        } else {
            Self(normalised)
        }
    }

    /// Whether the name fits the stored column.
    pub fn fits_column(&self) -> bool {
        self.0.chars().count() <= LANGUAGE_MAX
    }

    /// Free-tier accounts may only chat in English.
    pub fn is_english(&self) -> bool {
        matches!(self.0.as_str(), "english" | "en")
    }
}

impl Default for Language {
    fn default() -> Self {
        Self(Self::ENGLISH.to_owned())
    }
}

impl AsRef<str> for Language {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.0
    }
}

/// Validated chat prompt submitted by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub message: String,
    pub language: Language,
}

impl ChatPrompt {
    /// Trim the message and check both length limits.
    pub fn try_new(
        user_id: UserId,
        session_id: SessionId,
        message: &str,
        language: Language,
    ) -> Result<Self, ChatValidationError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatValidationError::EmptyMessage);
        }
        if message.chars().count() > MESSAGE_MAX {
            return Err(ChatValidationError::MessageTooLong { max: MESSAGE_MAX });
        }
        if !language.fits_column() {
            return Err(ChatValidationError::LanguageTooLong { max: LANGUAGE_MAX });
        }
        Ok(Self {
            user_id,
            session_id,
            message: message.to_owned(),
            language,
        })
    }
}

/// One persisted prompt/response exchange. Never updated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    #[schema(value_type = String, format = Uuid)]
    pub user_id: UserId,
    #[schema(value_type = String)]
    pub session_id: SessionId,
    /// Trimmed user prompt.
    pub message: String,
    /// Model reply, stored verbatim.
    pub response: String,
    #[schema(value_type = String)]
    pub language: Language,
    pub created_at: DateTime<Utc>,
}

/// Aggregate view of one session, listed most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatSessionSummary {
    #[schema(value_type = String)]
    pub session_id: SessionId,
    /// Prompt of the newest exchange.
    pub last_message: String,
    pub message_count: u32,
    /// Creation time of the newest exchange.
    pub last_activity: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("english", true)]
    #[case("EN", true)]
    #[case("spanish", false)]
    #[case("   ", true)]
    fn language_detects_english(#[case] raw: &str, #[case] english: bool) {
        assert_eq!(Language::new(raw).is_english(), english);
    }

    #[rstest]
    #[case("", ChatValidationError::EmptySessionId)]
    #[case("   ", ChatValidationError::EmptySessionId)]
    fn session_id_rejects_blank(#[case] raw: &str, #[case] expected: ChatValidationError) {
        assert_eq!(SessionId::new(raw).expect_err("blank"), expected);
    }

    #[rstest]
    fn session_id_rejects_overlong() {
        let raw = "s".repeat(SESSION_ID_MAX + 1);
        assert_eq!(
            SessionId::new(raw).expect_err("too long"),
            ChatValidationError::SessionIdTooLong {
                max: SESSION_ID_MAX
            }
        );
    }

    #[rstest]
    fn prompt_trims_message_and_rejects_blank() {
        let user = UserId::random();
        let session = SessionId::new("s-1").expect("session");
        let prompt = ChatPrompt::try_new(user.clone(), session.clone(), "  hi ", Language::default())
            .expect("valid prompt");
        assert_eq!(prompt.message, "hi");

        let err = ChatPrompt::try_new(user, session, " \n ", Language::default())
            .expect_err("blank message");
        assert_eq!(err, ChatValidationError::EmptyMessage);
    }

    #[rstest]
    #[case(MESSAGE_MAX + 1, 5, ChatValidationError::MessageTooLong { max: MESSAGE_MAX })]
    #[case(5, LANGUAGE_MAX + 1, ChatValidationError::LanguageTooLong { max: LANGUAGE_MAX })]
    fn prompt_rejects_overlong_fields(
        #[case] message_len: usize,
        #[case] language_len: usize,
        #[case] expected: ChatValidationError,
    ) {
        let err = ChatPrompt::try_new(
            UserId::random(),
            SessionId::new("s-1").expect("session"),
            &"m".repeat(message_len),
            Language::new("l".repeat(language_len)),
        )
        .expect_err("too long");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn language_at_column_width_is_accepted() {
        let language = Language::new("l".repeat(LANGUAGE_MAX));
        assert!(language.fits_column());
        ChatPrompt::try_new(
            UserId::random(),
            SessionId::new("s-1").expect("session"),
            "hello",
            language,
        )
        .expect("fits");
    }
}
