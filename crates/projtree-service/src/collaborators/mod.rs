//! Narrow interfaces to the services that live outside the tree engine.
//!
//! The engine only talks to its companions through these traits. The
//! [`memory`] module provides in-process implementations used by the CLI and
//! by tests.

pub mod memory;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use projtree_core::result::AppResult;
use projtree_core::types::id::{EntityId, ProjectId, UserId};
use projtree_entity::{DocListing, FileListing, FileRef};

use crate::notifier::{
    ProjectStructureChanges, RoomEvent, TpdsAddDoc, TpdsAddFile, TpdsDeleteEntity, TpdsMoveEntity,
};

/// Content of a doc as held by the content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDoc {
    /// Doc lines.
    pub lines: Vec<String>,
    /// Content revision, bumped on every modifying write.
    pub rev: u64,
    /// Editor version the content corresponds to.
    pub version: u64,
    /// Tracked changes and comments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranges: Option<serde_json::Value>,
}

impl StoredDoc {
    /// Whether the doc carries any tracked changes or comments.
    pub fn has_ranges(&self) -> bool {
        let Some(ranges) = &self.ranges else {
            return false;
        };
        ["changes", "comments"].iter().any(|key| {
            ranges
                .get(key)
                .and_then(|v| v.as_array())
                .is_some_and(|items| !items.is_empty())
        })
    }
}

/// Outcome of a content write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocWrite {
    /// Whether the stored content changed.
    pub modified: bool,
    /// Revision after the write.
    pub rev: u64,
}

/// Stores doc content.
#[async_trait]
pub trait ContentStore: Send + Sync + std::fmt::Debug {
    /// Write doc content.
    async fn update_doc(
        &self,
        project_id: ProjectId,
        doc_id: EntityId,
        lines: &[String],
        version: u64,
        ranges: Option<&serde_json::Value>,
    ) -> AppResult<DocWrite>;

    /// Read doc content. Fails with `NotFound` for unknown docs.
    async fn get_doc(&self, project_id: ProjectId, doc_id: EntityId) -> AppResult<StoredDoc>;

    /// Mark a doc deleted.
    async fn delete_doc(&self, project_id: ProjectId, doc_id: EntityId) -> AppResult<()>;

    /// Whether the doc was deleted.
    async fn is_doc_deleted(&self, project_id: ProjectId, doc_id: EntityId) -> AppResult<bool>;

    /// Move every doc of a project to cold storage.
    async fn archive_project(&self, project_id: ProjectId) -> AppResult<()>;

    /// Permanently remove every doc of a project.
    async fn destroy_project(&self, project_id: ProjectId) -> AppResult<()>;
}

/// Metadata for a file upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    /// File name.
    pub name: String,
    /// Revision to record.
    #[serde(default)]
    pub rev: u64,
    /// Provenance, if imported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_file_data: Option<serde_json::Value>,
}

/// Result of a file upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    /// New file reference, ready to insert in the tree.
    pub file_ref: FileRef,
    /// Whether a new blob was created (false when deduplicated).
    pub created_blob: bool,
}

/// Stores binary file content.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Upload the file at `local_path`.
    async fn upload_file_from_disk(
        &self,
        project_id: ProjectId,
        meta: FileMeta,
        local_path: &Path,
    ) -> AppResult<UploadedFile>;
}

/// Keeps the project history in step with the tree.
#[async_trait]
pub trait HistoryService: Send + Sync + std::fmt::Debug {
    /// Replace the history service's view of the whole tree.
    async fn resync_project_history(
        &self,
        project_id: ProjectId,
        history_id: &str,
        docs: Vec<DocListing>,
        files: Vec<FileListing>,
    ) -> AppResult<()>;

    /// Record a structure change.
    async fn update_project_structure(
        &self,
        project_id: ProjectId,
        history_id: Option<&str>,
        user_id: Option<UserId>,
        changes: ProjectStructureChanges,
        source: &str,
    ) -> AppResult<()>;

    /// Drop the history of a project.
    async fn delete_project(
        &self,
        project_id: ProjectId,
        history_id: Option<&str>,
    ) -> AppResult<()>;
}

/// Pushes events to connected editor clients.
#[async_trait]
pub trait RealtimeBroadcast: Send + Sync + std::fmt::Debug {
    /// Emit `event` to everyone in the project room.
    async fn emit_to_room(&self, project_id: ProjectId, event: RoomEvent) -> AppResult<()>;
}

/// Mirrors the tree into a third-party store.
#[async_trait]
pub trait StructureSync: Send + Sync + std::fmt::Debug {
    /// Push a doc.
    async fn add_doc(&self, update: TpdsAddDoc) -> AppResult<()>;
    /// Push a file.
    async fn add_file(&self, update: TpdsAddFile) -> AppResult<()>;
    /// Mirror a move or rename.
    async fn move_entity(&self, update: TpdsMoveEntity) -> AppResult<()>;
    /// Mirror a deletion.
    async fn delete_entity(&self, update: TpdsDeleteEntity) -> AppResult<()>;
}
