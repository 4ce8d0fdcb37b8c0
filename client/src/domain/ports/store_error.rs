//! Error shared by every remote table port.

use super::define_port_error;

define_port_error! {
    /// Errors raised by remote store adapters.
    pub enum RemoteStoreError {
        /// The backend could not be reached or failed server-side.
        Transport { message: String } => "remote store unavailable: {message}",
        /// The session was missing, expired or lacks row access.
        Unauthorized { message: String } => "not authorised: {message}",
        /// The backend refused the request (constraint, bad filter, etc.).
        Rejected { message: String } => "{message}",
        /// The addressed row does not exist.
        NotFound { message: String } => "not found: {message}",
        /// The response body did not match the expected shape.
        Decode { message: String } => "unexpected response: {message}",
    }
}
