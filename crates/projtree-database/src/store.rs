//! Store traits for live and soft-deleted projects.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use projtree_core::error::AppError;
use projtree_core::result::AppResult;
use projtree_core::types::id::{ProjectId, UserId};
use projtree_entity::{DeletedProject, Project};

use crate::update::TreeUpdate;

/// Persistence for live projects.
#[async_trait]
pub trait ProjectStore: Send + Sync + std::fmt::Debug {
    /// Find a project by id.
    async fn find(&self, id: ProjectId) -> AppResult<Option<Project>>;

    /// Insert a new project. Fails with `Conflict` if the id is taken.
    async fn insert(&self, project: &Project) -> AppResult<()>;

    /// Apply a targeted update atomically and return the updated project.
    ///
    /// Fails with `NotFound` when the project does not exist and with
    /// `Conflict` when any locator precondition no longer holds; nothing is
    /// written in either case.
    async fn apply_update(&self, id: ProjectId, update: &TreeUpdate) -> AppResult<Project>;

    /// Remove a project. Returns whether it existed.
    async fn remove(&self, id: ProjectId) -> AppResult<bool>;

    /// All projects owned by a user.
    async fn find_by_owner(&self, owner_id: UserId) -> AppResult<Vec<Project>>;

    /// Find a project by id, failing with `NotFound` when it is missing.
    async fn get(&self, id: ProjectId) -> AppResult<Project> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::not_found("project not found"))
    }
}

/// Persistence for soft-deleted project snapshots, keyed by the id of the
/// deleted project.
#[async_trait]
pub trait DeletedProjectStore: Send + Sync + std::fmt::Debug {
    /// Insert or replace the record for its deleted project id.
    async fn upsert(&self, record: &DeletedProject) -> AppResult<()>;

    /// Find the record for a deleted project.
    async fn find_by_project_id(&self, project_id: ProjectId) -> AppResult<Option<DeletedProject>>;

    /// Records deleted before `cutoff` whose snapshot has not been purged.
    async fn find_expired(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<DeletedProject>>;

    /// Replace an existing record. Fails with `NotFound` when it is missing.
    async fn update(&self, record: &DeletedProject) -> AppResult<()>;

    /// Remove the record for a deleted project. Returns whether it existed.
    async fn remove(&self, project_id: ProjectId) -> AppResult<bool>;
}
