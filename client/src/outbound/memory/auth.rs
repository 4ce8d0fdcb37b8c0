//! Auth gateway over in-memory accounts.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::broadcast;

use super::{Account, InMemoryBackend, State};
use crate::domain::ports::{AuthGateway, AuthGatewayError};
use crate::domain::{AuthEvent, AuthUser, Credentials, Session, SignUpOutcome, UserId};

const TOKEN_LIFETIME_SECONDS: i64 = 3600;

fn issue(state: &mut State, account: &Account, email: &str) -> Session {
    state.issued_tokens = state.issued_tokens.saturating_add(1);
    let serial = state.issued_tokens;
    let session = Session::new(
        AuthUser {
            id: account.id,
            email: Some(email.to_owned()),
        },
        format!("access-{serial}"),
        format!("refresh-{serial}"),
        Utc::now() + Duration::seconds(TOKEN_LIFETIME_SECONDS),
    );
    state.session = Some(session.clone());
    session
}

impl InMemoryBackend {
    fn signed_in(&self, session: Session) -> Session {
        self.publish(AuthEvent::SignedIn(session.clone()));
        session
    }
}

#[async_trait]
impl AuthGateway for InMemoryBackend {
    async fn current_session(&self) -> Result<Option<Session>, AuthGatewayError> {
        let refreshed = {
            let mut state = self.lock();
            let Some(current) = state.session.clone() else {
                return Ok(None);
            };
            if !current.needs_refresh(Utc::now()) {
                return Ok(Some(current));
            }
            state.issued_tokens = state.issued_tokens.saturating_add(1);
            let serial = state.issued_tokens;
            let renewed = Session::new(
                current.user().clone(),
                format!("access-{serial}"),
                format!("refresh-{serial}"),
                Utc::now() + Duration::seconds(TOKEN_LIFETIME_SECONDS),
            );
            state.session = Some(renewed.clone());
            renewed
        };
        self.publish(AuthEvent::TokenRefreshed(refreshed.clone()));
        Ok(Some(refreshed))
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthGatewayError> {
        let email = credentials.email();
        let session = {
            let mut state = self.lock();
            if state.accounts.contains_key(email) {
                return Err(AuthGatewayError::rejected("User already registered"));
            }
            let confirm = state.require_confirmation;
            let pending_code =
                confirm.then(|| format!("{:06}", state.accounts.len().saturating_add(100_000)));
            let account = Account {
                id: UserId::random(),
                password: credentials.password().to_owned(),
                confirmed: !confirm,
                pending_code,
            };
            state.accounts.insert(email.to_owned(), account.clone());
            if confirm {
                return Ok(SignUpOutcome::ConfirmationSent);
            }
            issue(&mut state, &account, email)
        };
        Ok(SignUpOutcome::SignedIn(self.signed_in(session)))
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthGatewayError> {
        let email = credentials.email();
        let session = {
            let mut state = self.lock();
            let account = state
                .accounts
                .get(email)
                .filter(|account| account.password == credentials.password())
                .cloned()
                .ok_or_else(|| AuthGatewayError::invalid_credentials("Invalid login credentials"))?;
            if !account.confirmed {
                return Err(AuthGatewayError::invalid_credentials("Email not confirmed"));
            }
            issue(&mut state, &account, email)
        };
        Ok(self.signed_in(session))
    }

    async fn verify_sign_up(&self, email: &str, code: &str) -> Result<Session, AuthGatewayError> {
        let session = {
            let mut state = self.lock();
            let account = state
                .accounts
                .get_mut(email)
                .filter(|account| account.pending_code.as_deref() == Some(code))
                .ok_or_else(|| {
                    AuthGatewayError::invalid_credentials("Token has expired or is invalid")
                })?;
            account.confirmed = true;
            account.pending_code = None;
            let confirmed = account.clone();
            issue(&mut state, &confirmed, email)
        };
        Ok(self.signed_in(session))
    }

    async fn sign_out(&self) -> Result<(), AuthGatewayError> {
        self.lock().session = None;
        self.publish(AuthEvent::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
