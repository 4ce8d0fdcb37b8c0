//! Port for the `todos` table.
//!
//! Soft-deleted rows are never returned by the list and count queries.

use async_trait::async_trait;

use crate::domain::{NewTask, ProjectId, Task, TaskId, TaskPatch, UserId};

use super::RemoteStoreError;

/// Read and write tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Incomplete tasks of a project ordered by `sort_order`.
    async fn list_open_in_project(&self, project: &ProjectId) -> Result<Vec<Task>, RemoteStoreError>;

    /// The `limit` most recently updated completed tasks of a project.
    async fn list_recently_completed(
        &self,
        project: &ProjectId,
        limit: usize,
    ) -> Result<Vec<Task>, RemoteStoreError>;

    /// Incomplete tasks across all projects assigned to `user`, earliest due
    /// date first, with the project name joined.
    async fn list_open_assigned_to(&self, user: &UserId) -> Result<Vec<Task>, RemoteStoreError>;

    /// Insert a task and return the stored row.
    async fn insert(&self, task: &NewTask) -> Result<Task, RemoteStoreError>;

    /// Apply a partial update and return the stored row.
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RemoteStoreError>;

    /// Delete a task row.
    async fn delete(&self, id: &TaskId) -> Result<(), RemoteStoreError>;

    /// Number of completed tasks assigned to `user`.
    async fn count_completed_assigned_to(&self, user: &UserId) -> Result<u64, RemoteStoreError>;
}
