//! Port for the `profiles` table.

use async_trait::async_trait;

use crate::domain::{Profile, ProfileUpdate, UserId};

use super::RemoteStoreError;

/// Read and upsert user profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch one profile. `None` when the user has no row yet.
    async fn find(&self, id: &UserId) -> Result<Option<Profile>, RemoteStoreError>;

    /// Insert or replace the caller's profile.
    async fn upsert(&self, update: &ProfileUpdate) -> Result<(), RemoteStoreError>;

    /// List up to `limit` profiles in store order.
    async fn list(&self, limit: usize) -> Result<Vec<Profile>, RemoteStoreError>;
}
