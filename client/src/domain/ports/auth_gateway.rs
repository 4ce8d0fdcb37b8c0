//! Port for the hosted authentication service.
//!
//! The gateway owns the current session. Every change to it is also
//! published as an [`AuthEvent`] so the board can follow sign-ins, token
//! refreshes and sign-outs that it did not initiate itself.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::{AuthEvent, Credentials, Session, SignUpOutcome};

use super::define_port_error;

define_port_error! {
    /// Errors raised by auth gateway adapters.
    pub enum AuthGatewayError {
        /// Email/password or verification code were not accepted.
        InvalidCredentials { message: String } => "{message}",
        /// The service refused the request for another reason.
        Rejected { message: String } => "{message}",
        /// The service could not be reached.
        Transport { message: String } => "auth service unavailable: {message}",
        /// The response body did not match the expected shape.
        Decode { message: String } => "unexpected auth response: {message}",
    }
}

/// Port for sign-in, sign-up and session tracking.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// The live session, refreshing its access token when it is stale.
    async fn current_session(&self) -> Result<Option<Session>, AuthGatewayError>;

    /// Register a new account.
    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, AuthGatewayError>;

    /// Exchange email and password for a session.
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthGatewayError>;

    /// Confirm a sign-up with the one-time code sent by email.
    async fn verify_sign_up(&self, email: &str, code: &str) -> Result<Session, AuthGatewayError>;

    /// End the session. The local session is dropped even if the remote
    /// call fails.
    async fn sign_out(&self) -> Result<(), AuthGatewayError>;

    /// Receive future auth-state changes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
