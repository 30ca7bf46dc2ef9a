//! In-process collaborator implementations.
//!
//! The content and blob stores keep real state. The history, structure-sync
//! and broadcast implementations record every call so callers can inspect
//! what would have been sent.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

use projtree_core::error::AppError;
use projtree_core::result::AppResult;
use projtree_core::types::id::{EntityId, ProjectId, UserId};
use projtree_entity::{DocListing, FileListing, FileRef};

use super::{
    BlobStore, ContentStore, DocWrite, FileMeta, HistoryService, RealtimeBroadcast, StoredDoc,
    StructureSync, UploadedFile,
};
use crate::notifier::{
    ProjectStructureChanges, RoomEvent, TpdsAddDoc, TpdsAddFile, TpdsDeleteEntity, TpdsMoveEntity,
};

#[derive(Debug, Clone)]
struct ContentEntry {
    doc: StoredDoc,
    deleted: bool,
    archived: bool,
}

/// In-memory content store.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    docs: DashMap<(ProjectId, EntityId), ContentEntry>,
    fail_archive: AtomicBool,
}

impl MemoryContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `archive_project` call fail.
    pub fn fail_archives(&self) {
        self.fail_archive.store(true, Ordering::SeqCst);
    }

    /// Number of live (not deleted) docs stored for a project.
    pub fn live_doc_count(&self, project_id: ProjectId) -> usize {
        self.docs
            .iter()
            .filter(|e| e.key().0 == project_id && !e.deleted)
            .count()
    }

    /// Whether every doc of the project is archived.
    pub fn is_archived(&self, project_id: ProjectId) -> bool {
        let mut docs = self.docs.iter().filter(|e| e.key().0 == project_id).peekable();
        docs.peek().is_some() && docs.all(|e| e.archived)
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn update_doc(
        &self,
        project_id: ProjectId,
        doc_id: EntityId,
        lines: &[String],
        version: u64,
        ranges: Option<&serde_json::Value>,
    ) -> AppResult<DocWrite> {
        let mut entry = self
            .docs
            .entry((project_id, doc_id))
            .or_insert_with(|| ContentEntry {
                doc: StoredDoc {
                    lines: Vec::new(),
                    rev: 0,
                    version: 0,
                    ranges: None,
                },
                deleted: false,
                archived: false,
            });

        let modified = entry.doc.rev == 0
            || entry.doc.lines != lines
            || entry.doc.ranges.as_ref() != ranges;
        if modified {
            entry.doc.lines = lines.to_vec();
            entry.doc.ranges = ranges.cloned();
            entry.doc.rev += 1;
        }
        entry.doc.version = version;
        entry.archived = false;

        debug!(
            project_id = %project_id,
            doc_id = %doc_id,
            modified,
            rev = entry.doc.rev,
            "Stored doc content"
        );
        Ok(DocWrite {
            modified,
            rev: entry.doc.rev,
        })
    }

    async fn get_doc(&self, project_id: ProjectId, doc_id: EntityId) -> AppResult<StoredDoc> {
        self.docs
            .get(&(project_id, doc_id))
            .map(|e| e.doc.clone())
            .ok_or_else(|| AppError::not_found("doc not found"))
    }

    async fn delete_doc(&self, project_id: ProjectId, doc_id: EntityId) -> AppResult<()> {
        let mut entry = self
            .docs
            .get_mut(&(project_id, doc_id))
            .ok_or_else(|| AppError::not_found("doc not found"))?;
        entry.deleted = true;
        Ok(())
    }

    async fn is_doc_deleted(&self, project_id: ProjectId, doc_id: EntityId) -> AppResult<bool> {
        Ok(self
            .docs
            .get(&(project_id, doc_id))
            .is_some_and(|e| e.deleted))
    }

    async fn archive_project(&self, project_id: ProjectId) -> AppResult<()> {
        if self.fail_archive.load(Ordering::SeqCst) {
            return Err(AppError::external_service("content store unavailable"));
        }
        for mut entry in self.docs.iter_mut() {
            if entry.key().0 == project_id {
                entry.archived = true;
            }
        }
        Ok(())
    }

    async fn destroy_project(&self, project_id: ProjectId) -> AppResult<()> {
        self.docs.retain(|key, _| key.0 != project_id);
        Ok(())
    }
}

/// In-memory blob store, deduplicating by content hash.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, Bytes>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Content of the blob with `hash`.
    pub fn blob(&self, hash: &str) -> Option<Bytes> {
        self.blobs.get(hash).map(|b| b.value().clone())
    }

    /// Number of distinct blobs stored.
    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload_file_from_disk(
        &self,
        project_id: ProjectId,
        meta: FileMeta,
        local_path: &Path,
    ) -> AppResult<UploadedFile> {
        let bytes = tokio::fs::read(local_path).await.map_err(|e| {
            AppError::with_source(
                projtree_core::ErrorKind::Storage,
                format!("Failed to read upload {}", local_path.display()),
                e,
            )
        })?;
        let hash = content_hash(&bytes);
        let created_blob = !self.blobs.contains_key(&hash);
        if created_blob {
            self.blobs.insert(hash.clone(), Bytes::from(bytes));
        }

        let file_ref = FileRef {
            id: EntityId::new(),
            name: meta.name,
            rev: meta.rev,
            hash: Some(hash),
            created: Utc::now(),
            linked_file_data: meta.linked_file_data,
        };
        debug!(project_id = %project_id, file_id = %file_ref.id, created_blob, "Uploaded file");
        Ok(UploadedFile {
            file_ref,
            created_blob,
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A call made to the history service.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryCall {
    /// `resync_project_history`.
    Resync {
        project_id: ProjectId,
        history_id: String,
        docs: Vec<DocListing>,
        files: Vec<FileListing>,
    },
    /// `update_project_structure`.
    UpdateStructure {
        project_id: ProjectId,
        history_id: Option<String>,
        user_id: Option<UserId>,
        changes: ProjectStructureChanges,
        source: String,
    },
    /// `delete_project`.
    DeleteProject {
        project_id: ProjectId,
        history_id: Option<String>,
    },
}

/// History service that records every call.
#[derive(Debug, Default)]
pub struct RecordingHistory {
    calls: Mutex<Vec<HistoryCall>>,
}

impl RecordingHistory {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded so far.
    pub fn calls(&self) -> Vec<HistoryCall> {
        lock(&self.calls).clone()
    }

    /// Structure changes recorded so far.
    pub fn structure_updates(&self) -> Vec<ProjectStructureChanges> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                HistoryCall::UpdateStructure { changes, .. } => Some(changes.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl HistoryService for RecordingHistory {
    async fn resync_project_history(
        &self,
        project_id: ProjectId,
        history_id: &str,
        docs: Vec<DocListing>,
        files: Vec<FileListing>,
    ) -> AppResult<()> {
        lock(&self.calls).push(HistoryCall::Resync {
            project_id,
            history_id: history_id.to_string(),
            docs,
            files,
        });
        Ok(())
    }

    async fn update_project_structure(
        &self,
        project_id: ProjectId,
        history_id: Option<&str>,
        user_id: Option<UserId>,
        changes: ProjectStructureChanges,
        source: &str,
    ) -> AppResult<()> {
        lock(&self.calls).push(HistoryCall::UpdateStructure {
            project_id,
            history_id: history_id.map(str::to_string),
            user_id,
            changes,
            source: source.to_string(),
        });
        Ok(())
    }

    async fn delete_project(
        &self,
        project_id: ProjectId,
        history_id: Option<&str>,
    ) -> AppResult<()> {
        lock(&self.calls).push(HistoryCall::DeleteProject {
            project_id,
            history_id: history_id.map(str::to_string),
        });
        Ok(())
    }
}

/// A call made to the structure-sync service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCall {
    /// `add_doc`.
    AddDoc(TpdsAddDoc),
    /// `add_file`.
    AddFile(TpdsAddFile),
    /// `move_entity`.
    MoveEntity(TpdsMoveEntity),
    /// `delete_entity`.
    DeleteEntity(TpdsDeleteEntity),
}

/// Structure-sync service that records every call.
#[derive(Debug, Default)]
pub struct RecordingStructureSync {
    calls: Mutex<Vec<SyncCall>>,
}

impl RecordingStructureSync {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded so far.
    pub fn calls(&self) -> Vec<SyncCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl StructureSync for RecordingStructureSync {
    async fn add_doc(&self, update: TpdsAddDoc) -> AppResult<()> {
        lock(&self.calls).push(SyncCall::AddDoc(update));
        Ok(())
    }

    async fn add_file(&self, update: TpdsAddFile) -> AppResult<()> {
        lock(&self.calls).push(SyncCall::AddFile(update));
        Ok(())
    }

    async fn move_entity(&self, update: TpdsMoveEntity) -> AppResult<()> {
        lock(&self.calls).push(SyncCall::MoveEntity(update));
        Ok(())
    }

    async fn delete_entity(&self, update: TpdsDeleteEntity) -> AppResult<()> {
        lock(&self.calls).push(SyncCall::DeleteEntity(update));
        Ok(())
    }
}

/// Broadcaster that records every emitted event.
#[derive(Debug, Default)]
pub struct RecordingBroadcast {
    events: Mutex<Vec<(ProjectId, RoomEvent)>>,
}

impl RecordingBroadcast {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events emitted so far.
    pub fn events(&self) -> Vec<(ProjectId, RoomEvent)> {
        lock(&self.events).clone()
    }

    /// Wire names of the events emitted so far.
    pub fn event_names(&self) -> Vec<&'static str> {
        lock(&self.events).iter().map(|(_, e)| e.name()).collect()
    }
}

#[async_trait]
impl RealtimeBroadcast for RecordingBroadcast {
    async fn emit_to_room(&self, project_id: ProjectId, event: RoomEvent) -> AppResult<()> {
        lock(&self.events).push((project_id, event));
        Ok(())
    }
}
