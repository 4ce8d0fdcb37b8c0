//! Domain ports for the hexagonal boundary.
//!
//! Outbound adapters implement these traits against the hosted backend;
//! the board only ever talks to them through `Arc<dyn Trait>`.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_gateway;
mod confirm_prompt;
mod membership_repository;
mod profile_repository;
mod project_repository;
mod store_error;
mod task_repository;

#[cfg(test)]
pub use auth_gateway::MockAuthGateway;
pub use auth_gateway::{AuthGateway, AuthGatewayError};
#[cfg(test)]
pub use confirm_prompt::MockConfirmPrompt;
pub use confirm_prompt::{AssumeYes, ConfirmPrompt};
#[cfg(test)]
pub use membership_repository::MockMembershipRepository;
pub use membership_repository::MembershipRepository;
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::ProfileRepository;
#[cfg(test)]
pub use project_repository::MockProjectRepository;
pub use project_repository::ProjectRepository;
pub use store_error::RemoteStoreError;
#[cfg(test)]
pub use task_repository::MockTaskRepository;
pub use task_repository::TaskRepository;
