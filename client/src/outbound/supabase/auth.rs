//! Auth API adapter: password grant, refresh, sign-up and code verification.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::client::{SupabaseClient, error_message};
use super::dto::{PasswordBody, RefreshBody, SessionDto, SignUpResponseDto, VerifyBody};
use crate::domain::ports::{AuthGateway, AuthGatewayError};
use crate::domain::{AuthEvent, Credentials, Session, SignUpOutcome};

/// How a failed auth call's client errors should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthCall {
    /// Password grant, refresh grant or code verification.
    Credential,
    /// Any other endpoint.
    Other,
}

/// Session state seen by a request that needs a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Freshness {
    /// No session was stored.
    Anonymous,
    /// A usable session, refreshed if it was stale.
    Live(Session),
    /// A stored session whose refresh was refused. It has been cleared.
    Revoked,
}

impl SupabaseClient {
    /// Current session, refreshing the access token when it is stale.
    ///
    /// Concurrent callers share one refresh. A refused refresh ends the
    /// session, publishes [`AuthEvent::SignedOut`] and reports
    /// [`Freshness::Revoked`].
    pub(super) async fn fresh_session(&self) -> Result<Freshness, AuthGatewayError> {
        let Some(current) = self.stored_session() else {
            return Ok(Freshness::Anonymous);
        };
        if !current.needs_refresh(Utc::now()) {
            return Ok(Freshness::Live(current));
        }
        let _guard = self.refresh_lock.lock().await;
        // Re-read: another caller may have refreshed, or been refused, while
        // we waited.
        let Some(latest) = self.stored_session() else {
            return Ok(Freshness::Revoked);
        };
        if !latest.needs_refresh(Utc::now()) {
            return Ok(Freshness::Live(latest));
        }
        let refreshed = self
            .token_grant(
                "refresh_token",
                &RefreshBody {
                    refresh_token: latest.refresh_token(),
                },
            )
            .await;
        match refreshed {
            Ok(session) => {
                debug!(user = %session.user().id, "access token refreshed");
                self.store_session(Some(session.clone()));
                self.publish(AuthEvent::TokenRefreshed(session.clone()));
                Ok(Freshness::Live(session))
            }
            Err(AuthGatewayError::InvalidCredentials { message }) => {
                warn!(error = %message, "refresh token rejected; signing out");
                self.store_session(None);
                self.publish(AuthEvent::SignedOut);
                Ok(Freshness::Revoked)
            }
            Err(err) => Err(err),
        }
    }

    async fn token_grant<B: Serialize + Sync>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<Session, AuthGatewayError> {
        let path = format!("token?grant_type={grant_type}");
        let bytes = self.auth_post(&path, body, None, AuthCall::Credential).await?;
        decode_session(&bytes)
    }

    /// Store a new session and announce it.
    fn establish(&self, session: Session) -> Session {
        info!(user = %session.user().id, "signed in");
        self.store_session(Some(session.clone()));
        self.publish(AuthEvent::SignedIn(session.clone()));
        session
    }

    async fn auth_post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
        call: AuthCall,
    ) -> Result<Vec<u8>, AuthGatewayError> {
        let url = self
            .auth_url(path)
            .map_err(|err| AuthGatewayError::rejected(err.to_string()))?;
        let response = self
            .http
            .post(url)
            .header("apikey", self.anon_key())
            .bearer_auth(bearer.unwrap_or_else(|| self.anon_key()))
            .json(body)
            .send()
            .await
            .map_err(|err| AuthGatewayError::transport(err.to_string()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| AuthGatewayError::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(map_auth_status(status, bytes.as_ref(), call));
        }
        Ok(bytes.to_vec())
    }
}

fn decode_session(body: &[u8]) -> Result<Session, AuthGatewayError> {
    serde_json::from_slice::<SessionDto>(body)
        .map(|dto| dto.into_session(Utc::now()))
        .map_err(|err| AuthGatewayError::decode(err.to_string()))
}

fn map_auth_status(status: StatusCode, body: &[u8], call: AuthCall) -> AuthGatewayError {
    let message = error_message(status, body);
    match status {
        StatusCode::TOO_MANY_REQUESTS => AuthGatewayError::rejected(message),
        _ if status.is_client_error() && call == AuthCall::Credential => {
            AuthGatewayError::invalid_credentials(message)
        }
        _ if status.is_client_error() => AuthGatewayError::rejected(message),
        _ => AuthGatewayError::transport(message),
    }
}

#[async_trait]
impl AuthGateway for SupabaseClient {
    async fn current_session(&self) -> Result<Option<Session>, AuthGatewayError> {
        match self.fresh_session().await? {
            Freshness::Live(session) => Ok(Some(session)),
            Freshness::Anonymous | Freshness::Revoked => Ok(None),
        }
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthGatewayError> {
        let body = PasswordBody {
            email: credentials.email(),
            password: credentials.password(),
        };
        let bytes = self.auth_post("signup", &body, None, AuthCall::Other).await?;
        let response: SignUpResponseDto =
            serde_json::from_slice(&bytes).map_err(|err| AuthGatewayError::decode(err.to_string()))?;
        match response {
            SignUpResponseDto::Session(dto) => Ok(SignUpOutcome::SignedIn(
                self.establish(dto.into_session(Utc::now())),
            )),
            SignUpResponseDto::User(user) => {
                info!(user = %user.id, "sign-up pending email confirmation");
                Ok(SignUpOutcome::ConfirmationSent)
            }
        }
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthGatewayError> {
        let body = PasswordBody {
            email: credentials.email(),
            password: credentials.password(),
        };
        let session = self.token_grant("password", &body).await?;
        Ok(self.establish(session))
    }

    async fn verify_sign_up(&self, email: &str, code: &str) -> Result<Session, AuthGatewayError> {
        let body = VerifyBody {
            kind: "signup",
            email,
            token: code,
        };
        let bytes = self
            .auth_post("verify", &body, None, AuthCall::Credential)
            .await?;
        let session = decode_session(&bytes)?;
        Ok(self.establish(session))
    }

    async fn sign_out(&self) -> Result<(), AuthGatewayError> {
        let previous = self.stored_session();
        self.store_session(None);
        let remote = match &previous {
            Some(session) => self
                .auth_post(
                    "logout",
                    &serde_json::Map::new(),
                    Some(session.access_token()),
                    AuthCall::Other,
                )
                .await
                .map(drop),
            None => Ok(()),
        };
        self.publish(AuthEvent::SignedOut);
        remote
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.subscribe_events()
    }
}
