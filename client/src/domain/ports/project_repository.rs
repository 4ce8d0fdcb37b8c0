//! Port for the `projects` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{NewProject, Project, ProjectId};

use super::RemoteStoreError;

/// Project rows. Deletion is soft.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Projects among `ids` that are not soft-deleted, by `sort_order`.
    async fn list_active(&self, ids: &[ProjectId]) -> Result<Vec<Project>, RemoteStoreError>;

    /// Insert a project and return the stored row.
    async fn create(&self, project: &NewProject) -> Result<Project, RemoteStoreError>;

    /// Mark a project deleted as of `at`.
    async fn soft_delete(&self, id: &ProjectId, at: DateTime<Utc>) -> Result<(), RemoteStoreError>;
}
