//! PostgreSQL stores: one JSONB document per project.
//!
//! Tree updates run as read-modify-write inside a transaction that holds the
//! project row with `SELECT ... FOR UPDATE`, which gives the same atomicity
//! as a single-document update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;

use projtree_core::error::{AppError, ErrorKind};
use projtree_core::result::AppResult;
use projtree_core::types::id::{ProjectId, UserId};
use projtree_entity::{DeletedProject, Project};

use crate::store::{DeletedProjectStore, ProjectStore};
use crate::update::{TreeUpdate, apply_update};

/// Project store backed by the `projects` table.
#[derive(Debug, Clone)]
pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    /// Create a new project store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn find(&self, id: ProjectId) -> AppResult<Option<Project>> {
        sqlx::query_scalar::<_, Json<Project>>("SELECT document FROM projects WHERE id = $1")
            .bind(id.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(|Json(project)| project))
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find project", e))
    }

    async fn insert(&self, project: &Project) -> AppResult<()> {
        let result = sqlx::query(
            "INSERT INTO projects (id, owner_id, name, version, document, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (id) DO NOTHING",
        )
        .bind(project.id.into_uuid())
        .bind(project.owner_id.into_uuid())
        .bind(&project.name)
        .bind(project.version as i64)
        .bind(Json(project))
        .bind(project.last_updated)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert project", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "project {} already exists",
                project.id
            )));
        }
        Ok(())
    }

    async fn apply_update(&self, id: ProjectId, update: &TreeUpdate) -> AppResult<Project> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let Json(mut project) = sqlx::query_scalar::<_, Json<Project>>(
            "SELECT document FROM projects WHERE id = $1 FOR UPDATE",
        )
        .bind(id.into_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock project", e))?
        .ok_or_else(|| AppError::not_found("project not found"))?;

        // Dropping the transaction on error rolls it back.
        apply_update(&mut project, update)?;

        sqlx::query(
            "UPDATE projects SET name = $2, version = $3, document = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(id.into_uuid())
        .bind(&project.name)
        .bind(project.version as i64)
        .bind(Json(&project))
        .bind(project.last_updated)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update project", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit project update", e)
        })?;

        debug!(project_id = %id, version = project.version, "Applied tree update");
        Ok(project)
    }

    async fn remove(&self, id: ProjectId) -> AppResult<bool> {
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id.into_uuid())
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected() > 0)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to remove project", e))
    }

    async fn find_by_owner(&self, owner_id: UserId) -> AppResult<Vec<Project>> {
        sqlx::query_scalar::<_, Json<Project>>(
            "SELECT document FROM projects WHERE owner_id = $1 ORDER BY name ASC",
        )
        .bind(owner_id.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(|Json(project)| project).collect())
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list projects by owner", e)
        })
    }
}

/// Soft-deleted project store backed by the `deleted_projects` table.
#[derive(Debug, Clone)]
pub struct PgDeletedProjectStore {
    pool: PgPool,
}

impl PgDeletedProjectStore {
    /// Create a new deleted project store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeletedProjectStore for PgDeletedProjectStore {
    async fn upsert(&self, record: &DeletedProject) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO deleted_projects (project_id, id, deleted_at, expired, document) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (project_id) DO UPDATE SET \
                id = EXCLUDED.id, deleted_at = EXCLUDED.deleted_at, \
                expired = EXCLUDED.expired, document = EXCLUDED.document",
        )
        .bind(record.deleter_data.deleted_project_id.into_uuid())
        .bind(record.id.into_uuid())
        .bind(record.deleter_data.deleted_at)
        .bind(record.is_expired())
        .bind(Json(record))
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to save deleted project", e)
        })
    }

    async fn find_by_project_id(&self, project_id: ProjectId) -> AppResult<Option<DeletedProject>> {
        sqlx::query_scalar::<_, Json<DeletedProject>>(
            "SELECT document FROM deleted_projects WHERE project_id = $1",
        )
        .bind(project_id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map(|row| row.map(|Json(record)| record))
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find deleted project", e)
        })
    }

    async fn find_expired(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<DeletedProject>> {
        sqlx::query_scalar::<_, Json<DeletedProject>>(
            "SELECT document FROM deleted_projects \
             WHERE deleted_at < $1 AND NOT expired ORDER BY deleted_at ASC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map(|rows| rows.into_iter().map(|Json(record)| record).collect())
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list expired projects", e)
        })
    }

    async fn update(&self, record: &DeletedProject) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE deleted_projects SET expired = $2, document = $3 WHERE project_id = $1",
        )
        .bind(record.deleter_data.deleted_project_id.into_uuid())
        .bind(record.is_expired())
        .bind(Json(record))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update deleted project", e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("deleted project not found"));
        }
        Ok(())
    }

    async fn remove(&self, project_id: ProjectId) -> AppResult<bool> {
        sqlx::query("DELETE FROM deleted_projects WHERE project_id = $1")
            .bind(project_id.into_uuid())
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected() > 0)
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to remove deleted project", e)
            })
    }
}
