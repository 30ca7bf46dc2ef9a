//! In-memory stores built on `dashmap`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use projtree_core::error::AppError;
use projtree_core::result::AppResult;
use projtree_core::types::id::{ProjectId, UserId};
use projtree_entity::{DeletedProject, Project};

use crate::store::{DeletedProjectStore, ProjectStore};
use crate::update::{TreeUpdate, apply_update};

/// In-memory project store.
///
/// Updates hold the map shard for the project while they are applied, so
/// concurrent updates to one project are serialized.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    projects: DashMap<ProjectId, Project>,
}

impl MemoryProjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored projects.
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn find(&self, id: ProjectId) -> AppResult<Option<Project>> {
        Ok(self.projects.get(&id).map(|p| p.value().clone()))
    }

    async fn insert(&self, project: &Project) -> AppResult<()> {
        match self.projects.entry(project.id) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "project {} already exists",
                project.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(project.clone());
                Ok(())
            }
        }
    }

    async fn apply_update(&self, id: ProjectId, update: &TreeUpdate) -> AppResult<Project> {
        let mut entry = self
            .projects
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("project not found"))?;

        let mut next = entry.value().clone();
        apply_update(&mut next, update)?;
        *entry.value_mut() = next.clone();

        debug!(project_id = %id, version = next.version, ops = update.ops.len(), "Applied tree update");
        Ok(next)
    }

    async fn remove(&self, id: ProjectId) -> AppResult<bool> {
        Ok(self.projects.remove(&id).is_some())
    }

    async fn find_by_owner(&self, owner_id: UserId) -> AppResult<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .map(|p| p.value().clone())
            .collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }
}

/// In-memory store for soft-deleted projects.
#[derive(Debug, Default)]
pub struct MemoryDeletedProjectStore {
    records: DashMap<ProjectId, DeletedProject>,
}

impl MemoryDeletedProjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeletedProjectStore for MemoryDeletedProjectStore {
    async fn upsert(&self, record: &DeletedProject) -> AppResult<()> {
        self.records
            .insert(record.deleter_data.deleted_project_id, record.clone());
        Ok(())
    }

    async fn find_by_project_id(&self, project_id: ProjectId) -> AppResult<Option<DeletedProject>> {
        Ok(self.records.get(&project_id).map(|r| r.value().clone()))
    }

    async fn find_expired(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<DeletedProject>> {
        let mut records: Vec<DeletedProject> = self
            .records
            .iter()
            .filter(|r| r.deleter_data.deleted_at < cutoff && !r.is_expired())
            .map(|r| r.value().clone())
            .collect();
        records.sort_by_key(|r| r.deleter_data.deleted_at);
        Ok(records)
    }

    async fn update(&self, record: &DeletedProject) -> AppResult<()> {
        let mut existing = self
            .records
            .get_mut(&record.deleter_data.deleted_project_id)
            .ok_or_else(|| AppError::not_found("deleted project not found"))?;
        *existing.value_mut() = record.clone();
        Ok(())
    }

    async fn remove(&self, project_id: ProjectId) -> AppResult<bool> {
        Ok(self.records.remove(&project_id).is_some())
    }
}
