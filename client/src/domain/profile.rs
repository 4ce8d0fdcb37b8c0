//! Per-user display identity, distinct from the auth identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::UserId;

/// Validation errors for profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValidationError {
    /// Nickname was missing or blank once trimmed.
    EmptyNickname,
}

impl fmt::Display for ProfileValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyNickname => write!(f, "nickname is required"),
        }
    }
}

impl std::error::Error for ProfileValidationError {}

/// Non-empty nickname shown across the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nickname(String);

impl Nickname {
    /// Validate and construct a [`Nickname`], trimming surrounding whitespace.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ProfileValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ProfileValidationError::EmptyNickname);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The nickname text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Nickname {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Nickname {
    type Error = ProfileValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Nickname> for String {
    fn from(value: Nickname) -> Self {
        value.0
    }
}

/// Profile row as stored remotely.
///
/// A profile may exist without a nickname (for example when created by a
/// database trigger); such users are routed to the setup screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Owning user.
    pub id: UserId,
    /// Display nickname; `None` until setup completes.
    pub nickname: Option<Nickname>,
    /// Optional free-form status line.
    pub status_message: Option<String>,
}

impl Profile {
    /// Whether the profile grants access to the main app.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.nickname.is_some()
    }

    /// Nickname text, or `fallback` when unset.
    #[must_use]
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.nickname.as_ref().map_or(fallback, Nickname::as_str)
    }
}

/// Profile values written by the setup and edit forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// Owning user.
    pub id: UserId,
    /// Required nickname.
    pub nickname: Nickname,
    /// Status line; blank input is stored as `None`.
    pub status_message: Option<String>,
}

impl ProfileUpdate {
    /// Validate raw form input for `id`.
    pub fn from_form(id: UserId, nickname: &str, status: &str) -> Result<Self, ProfileValidationError> {
        let nickname = Nickname::new(nickname)?;
        let trimmed = status.trim();
        Ok(Self {
            id,
            nickname,
            status_message: (!trimmed.is_empty()).then(|| trimmed.to_owned()),
        })
    }
}
