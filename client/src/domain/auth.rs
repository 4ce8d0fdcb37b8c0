//! Authentication primitives: credentials, sessions and auth-state events.
//!
//! Keep raw input parsing outside the board by exposing constructors that
//! validate string inputs before any call reaches the auth gateway.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use zeroize::Zeroizing;

use super::UserId;

/// Seconds before expiry at which an access token is treated as stale.
const EXPIRY_LEEWAY_SECONDS: i64 = 30;

/// Domain error returned when sign-in payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for CredentialsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for CredentialsValidationError {}

/// Validated email/password pair used for sign-in and sign-up.
///
/// ## Invariants
/// - `email` is trimmed and must not be empty after trimming.
/// - `password` must be non-empty but keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use team_sync::domain::Credentials;
///
/// let creds = Credentials::try_from_parts(" u@example.com ", "secret").unwrap();
/// assert_eq!(creds.email(), "u@example.com");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: Zeroizing<String>,
}

impl Credentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(CredentialsValidationError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            email: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email address used as the login name.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Identity owned by the auth service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Stable user id.
    pub id: UserId,
    /// Email address, when the service reports one.
    pub email: Option<String>,
}

/// Authenticated session returned by the auth service.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    user: AuthUser,
    access_token: Zeroizing<String>,
    refresh_token: Zeroizing<String>,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from the token pair issued for `user`.
    #[must_use]
    pub fn new(
        user: AuthUser,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user,
            access_token: Zeroizing::new(access_token.into()),
            refresh_token: Zeroizing::new(refresh_token.into()),
            expires_at,
        }
    }

    /// The signed-in user.
    #[must_use]
    pub const fn user(&self) -> &AuthUser {
        &self.user
    }

    /// Bearer token for data requests.
    #[must_use]
    pub fn access_token(&self) -> &str {
        self.access_token.as_str()
    }

    /// Token used to obtain a fresh access token.
    #[must_use]
    pub fn refresh_token(&self) -> &str {
        self.refresh_token.as_str()
    }

    /// Instant at which the access token stops being accepted.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the access token should be refreshed before use at `now`.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_LEEWAY_SECONDS) >= self.expires_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Auth-state change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A session was established (sign-in, sign-up or code confirmation).
    SignedIn(Session),
    /// The access token was renewed for the same user.
    TokenRefreshed(Session),
    /// The session ended.
    SignedOut,
}

/// Result of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The service emailed a confirmation code; no session yet.
    ConfirmationSent,
    /// The service confirmed the account immediately.
    SignedIn(Session),
}

/// Which form the auth screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Email/password sign-in.
    #[default]
    Login,
    /// Account registration.
    SignUp,
}
