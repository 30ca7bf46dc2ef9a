//! Soft deletion, restoration, and expiry of whole projects.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use projtree_core::config::DeleterConfig;
use projtree_core::error::AppError;
use projtree_core::result::AppResult;
use projtree_core::types::id::{DeletedProjectId, ProjectId};
use projtree_database::{DeletedProjectStore, ProjectStore};
use projtree_entity::{DeletedProject, DeleterData, Project};
use projtree_lock::LockManager;
use projtree_lock::keys::STRUCTURE_UPDATE;

use crate::collaborators::{ContentStore, HistoryService};
use crate::context::RequestContext;

/// Moves projects in and out of the deleted-projects archive.
#[derive(Debug, Clone)]
pub struct ProjectDeleter {
    /// Live projects.
    projects: Arc<dyn ProjectStore>,
    /// Deleted project records.
    deleted: Arc<dyn DeletedProjectStore>,
    /// Doc content store.
    content: Arc<dyn ContentStore>,
    /// Project history service.
    history: Arc<dyn HistoryService>,
    /// Locks shared with the entity update handler.
    locks: LockManager,
    /// Retention settings.
    config: DeleterConfig,
}

impl ProjectDeleter {
    /// Creates a new project deleter.
    pub fn new(
        projects: Arc<dyn ProjectStore>,
        deleted: Arc<dyn DeletedProjectStore>,
        content: Arc<dyn ContentStore>,
        history: Arc<dyn HistoryService>,
        locks: LockManager,
        config: DeleterConfig,
    ) -> Self {
        Self {
            projects,
            deleted,
            content,
            history,
            locks,
            config,
        }
    }

    /// Snapshot a project into the archive and remove the live copy.
    ///
    /// Holds the project's `structure_update` lock, so no tree change lands
    /// between the snapshot and the removal.
    pub async fn delete_project(
        &self,
        project_id: ProjectId,
        ctx: &RequestContext,
    ) -> AppResult<DeletedProject> {
        self.locks
            .run_with_lock(
                STRUCTURE_UPDATE,
                project_id,
                self.delete_locked(project_id, ctx),
            )
            .await
    }

    async fn delete_locked(
        &self,
        project_id: ProjectId,
        ctx: &RequestContext,
    ) -> AppResult<DeletedProject> {
        let project = self.projects.get(project_id).await?;
        let record = DeletedProject {
            id: DeletedProjectId::new(),
            deleter_data: DeleterData {
                deleted_at: Utc::now(),
                deleted_project_id: project.id,
                deleted_project_owner_id: project.owner_id,
                deleted_project_history_id: project.history_id().map(str::to_string),
                deleted_project_last_updated_at: project.last_updated,
                deleter_id: ctx.user_id,
                deleter_ip_address: ctx.ip_address.clone(),
            },
            project: Some(project),
        };
        self.deleted.upsert(&record).await?;

        if let Err(e) = self.content.archive_project(project_id).await {
            warn!(project_id = %project_id, error = %e, "Failed to archive project docs");
        }

        self.projects.remove(project_id).await?;
        info!(project_id = %project_id, "Project deleted");
        Ok(record)
    }

    /// Restore a deleted project under a fresh `(Restored)` name.
    pub async fn undelete_project(&self, project_id: ProjectId) -> AppResult<Project> {
        let record = self
            .deleted
            .find_by_project_id(project_id)
            .await?
            .ok_or_else(|| AppError::not_found("project_not_found"))?;
        let mut project = record
            .project
            .ok_or_else(|| AppError::not_found("project_too_old_to_restore"))?;

        let taken: HashSet<String> = self
            .projects
            .find_by_owner(project.owner_id)
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect();
        project.name = restored_name(&project.name, &taken);
        project.archived = false;

        self.projects.insert(&project).await?;
        self.deleted.remove(project_id).await?;
        info!(project_id = %project_id, name = %project.name, "Project restored");
        Ok(project)
    }

    /// Purge every record older than the retention period. Returns how many
    /// were purged.
    pub async fn expire_deleted_projects_after_duration(&self) -> AppResult<usize> {
        let cutoff = Utc::now() - Duration::days(self.config.expiry_days);
        let records = self.deleted.find_expired(cutoff).await?;
        let mut expired = 0;
        for record in records {
            let project_id = record.deleter_data.deleted_project_id;
            match self.expire_deleted_project(project_id).await {
                Ok(()) => expired += 1,
                Err(e) => {
                    warn!(project_id = %project_id, error = %e, "Failed to expire deleted project");
                }
            }
        }
        info!(expired, "Expired deleted projects");
        Ok(expired)
    }

    /// Purge one record: destroy content and history, drop the snapshot.
    ///
    /// If the project is live again the record is stale and is simply
    /// removed.
    pub async fn expire_deleted_project(&self, project_id: ProjectId) -> AppResult<()> {
        let Some(mut record) = self.deleted.find_by_project_id(project_id).await? else {
            warn!(project_id = %project_id, "No deleted project record to expire");
            return Ok(());
        };

        if self.projects.find(project_id).await?.is_some() {
            self.deleted.remove(project_id).await?;
            info!(project_id = %project_id, "Removed stale deleted project record");
            return Ok(());
        }

        self.content.destroy_project(project_id).await?;
        self.history
            .delete_project(
                project_id,
                record.deleter_data.deleted_project_history_id.as_deref(),
            )
            .await?;

        record.project = None;
        record.deleter_data.deleter_ip_address = None;
        self.deleted.update(&record).await?;
        info!(project_id = %project_id, "Deleted project expired");
        Ok(())
    }
}

/// `<name> (Restored)`, suffixed with ` (n)` until it is not in `taken`.
fn restored_name(name: &str, taken: &HashSet<String>) -> String {
    let base = format!("{name} (Restored)");
    if !taken.contains(&base) {
        return base;
    }
    (1..)
        .map(|n| format!("{base} ({n})"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use projtree_core::config::LockConfig;
    use projtree_core::error::ErrorKind;
    use projtree_core::types::id::UserId;
    use projtree_database::stores::memory::{MemoryDeletedProjectStore, MemoryProjectStore};

    use crate::collaborators::memory::{HistoryCall, MemoryContentStore, RecordingHistory};

    struct Fixture {
        projects: Arc<MemoryProjectStore>,
        deleted: Arc<MemoryDeletedProjectStore>,
        content: Arc<MemoryContentStore>,
        history: Arc<RecordingHistory>,
        locks: LockManager,
        deleter: ProjectDeleter,
    }

    fn fixture() -> Fixture {
        let projects = Arc::new(MemoryProjectStore::new());
        let deleted = Arc::new(MemoryDeletedProjectStore::new());
        let content = Arc::new(MemoryContentStore::new());
        let history = Arc::new(RecordingHistory::new());
        let locks = LockManager::new(&LockConfig {
            max_wait_seconds: 1,
            ..LockConfig::default()
        });
        let deleter = ProjectDeleter::new(
            projects.clone(),
            deleted.clone(),
            content.clone(),
            history.clone(),
            locks.clone(),
            DeleterConfig::default(),
        );
        Fixture {
            projects,
            deleted,
            content,
            history,
            locks,
            deleter,
        }
    }

    #[test]
    fn test_restored_name() {
        let mut taken = HashSet::new();
        assert_eq!(restored_name("thesis", &taken), "thesis (Restored)");
        taken.insert("thesis (Restored)".to_string());
        taken.insert("thesis (Restored) (1)".to_string());
        assert_eq!(restored_name("thesis", &taken), "thesis (Restored) (2)");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_waits_for_structure_lock() {
        let f = fixture();
        let project = Project::new("thesis", UserId::new());
        f.projects.insert(&project).await.unwrap();

        let guard = f.locks.acquire(STRUCTURE_UPDATE, project.id).await.unwrap();
        let err = f
            .deleter
            .delete_project(project.id, &RequestContext::system("test"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(f.projects.find(project.id).await.unwrap().is_some());
        assert!(f.deleted.find_by_project_id(project.id).await.unwrap().is_none());

        drop(guard);
        f.deleter
            .delete_project(project.id, &RequestContext::system("test"))
            .await
            .unwrap();
        assert!(f.projects.find(project.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_and_undelete() {
        let f = fixture();
        let owner = UserId::new();
        let project = Project::new("thesis", owner).with_history("h-7");
        f.projects.insert(&project).await.unwrap();
        f.projects
            .insert(&Project::new("thesis (Restored)", owner))
            .await
            .unwrap();

        let ctx = RequestContext::new(owner).with_ip("192.0.2.1");
        let record = f.deleter.delete_project(project.id, &ctx).await.unwrap();
        assert_eq!(record.deleter_data.deleter_id, Some(owner));
        assert_eq!(record.deleter_data.deleted_project_history_id.as_deref(), Some("h-7"));
        assert!(f.projects.find(project.id).await.unwrap().is_none());

        let restored = f.deleter.undelete_project(project.id).await.unwrap();
        assert_eq!(restored.name, "thesis (Restored) (1)");
        assert!(!restored.archived);
        assert!(f.projects.find(project.id).await.unwrap().is_some());
        assert!(f.deleted.find_by_project_id(project.id).await.unwrap().is_none());

        let err = f.deleter.undelete_project(project.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "project_not_found");
    }

    #[tokio::test]
    async fn test_archive_failure_is_swallowed() {
        let f = fixture();
        f.content.fail_archives();
        let project = Project::new("thesis", UserId::new());
        f.projects.insert(&project).await.unwrap();

        f.deleter
            .delete_project(project.id, &RequestContext::system("admin"))
            .await
            .unwrap();
        assert!(f.projects.find(project.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expire_purges_snapshot() {
        let f = fixture();
        let project = Project::new("thesis", UserId::new()).with_history("h-9");
        f.projects.insert(&project).await.unwrap();
        let ctx = RequestContext::new(project.owner_id).with_ip("192.0.2.1");
        f.deleter.delete_project(project.id, &ctx).await.unwrap();

        f.deleter.expire_deleted_project(project.id).await.unwrap();
        let record = f
            .deleted
            .find_by_project_id(project.id)
            .await
            .unwrap()
            .unwrap();
        assert!(record.is_expired());
        assert_eq!(record.deleter_data.deleter_ip_address, None);
        assert!(matches!(
            f.history.calls().last(),
            Some(HistoryCall::DeleteProject { history_id: Some(id), .. }) if id == "h-9"
        ));

        let err = f.deleter.undelete_project(project.id).await.unwrap_err();
        assert_eq!(err.message, "project_too_old_to_restore");
    }

    #[tokio::test]
    async fn test_expire_stale_record_when_project_is_live() {
        let f = fixture();
        let project = Project::new("thesis", UserId::new());
        f.projects.insert(&project).await.unwrap();
        f.deleter
            .delete_project(project.id, &RequestContext::system("admin"))
            .await
            .unwrap();
        f.projects.insert(&project).await.unwrap();

        f.deleter.expire_deleted_project(project.id).await.unwrap();
        assert!(f.deleted.find_by_project_id(project.id).await.unwrap().is_none());
        assert!(f.history.calls().is_empty());
    }

    #[tokio::test]
    async fn test_expire_after_duration_only_old_records() {
        let f = fixture();
        let old = Project::new("old", UserId::new());
        let fresh = Project::new("fresh", UserId::new());
        for project in [&old, &fresh] {
            f.projects.insert(project).await.unwrap();
            f.deleter
                .delete_project(project.id, &RequestContext::system("admin"))
                .await
                .unwrap();
        }

        let mut record = f.deleted.find_by_project_id(old.id).await.unwrap().unwrap();
        record.deleter_data.deleted_at = Utc::now() - Duration::days(91);
        f.deleted.update(&record).await.unwrap();

        let expired = f.deleter.expire_deleted_projects_after_duration().await.unwrap();
        assert_eq!(expired, 1);
        let fresh_record = f.deleted.find_by_project_id(fresh.id).await.unwrap().unwrap();
        assert!(!fresh_record.is_expired());
    }
}
