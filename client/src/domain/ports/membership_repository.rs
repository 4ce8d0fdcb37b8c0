//! Port for the `project_members` table.

use async_trait::async_trait;

use crate::domain::{Member, NewMembership, ProjectId, UserId};

use super::RemoteStoreError;

/// Read and write project memberships.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Projects the user belongs to.
    async fn project_ids_for_user(&self, user: &UserId) -> Result<Vec<ProjectId>, RemoteStoreError>;

    /// Insert a membership row.
    async fn add(&self, membership: &NewMembership) -> Result<(), RemoteStoreError>;

    /// Members of a project with their profile fields joined.
    async fn list_for_project(&self, project: &ProjectId) -> Result<Vec<Member>, RemoteStoreError>;

    /// Delete one membership row.
    async fn remove(&self, project: &ProjectId, user: &UserId) -> Result<(), RemoteStoreError>;
}
