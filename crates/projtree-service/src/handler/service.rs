//! Entity update handler: adds, folders, moves, renames, root doc, resync.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use projtree_core::config::AppConfig;
use projtree_core::result::AppResult;
use projtree_core::types::id::{EntityId, ProjectId};
use projtree_database::ProjectStore;
use projtree_entity::{Doc, EntityType, FileRef, Project};
use projtree_lock::LockManager;
use projtree_lock::keys::STRUCTURE_UPDATE;

use crate::collaborators::{
    BlobStore, ContentStore, FileMeta, HistoryService, RealtimeBroadcast, StructureSync,
};
use crate::context::RequestContext;
use crate::locator::find_element;
use crate::mutator::{FolderAdded, MkdirpOutcome, MoveOutcome, TreeMutator};
use crate::notifier::{ProjectStructureChanges, RoomEvent, TpdsAddDoc, TpdsAddFile, TpdsMoveEntity};
use crate::resync::{ResyncReconciler, ResyncReport};
use crate::safe_path::NameValidator;

/// The companion services the handler notifies.
#[derive(Debug, Clone)]
pub struct Collaborators {
    /// Doc content store.
    pub content: Arc<dyn ContentStore>,
    /// Binary file store.
    pub blobs: Arc<dyn BlobStore>,
    /// Project history service.
    pub history: Arc<dyn HistoryService>,
    /// Realtime room broadcaster.
    pub realtime: Arc<dyn RealtimeBroadcast>,
    /// Third-party store sync.
    pub tpds: Arc<dyn StructureSync>,
}

/// A doc created by [`EntityUpdateHandler::add_doc`].
#[derive(Debug, Clone)]
pub struct AddedDoc {
    /// The doc.
    pub doc: Doc,
    /// Folder it was added to.
    pub folder_id: EntityId,
    /// Path with a leading slash.
    pub path: String,
}

/// A file created by [`EntityUpdateHandler::add_file`].
#[derive(Debug, Clone)]
pub struct AddedFile {
    /// The file reference.
    pub file: FileRef,
    /// Folder it was added to.
    pub folder_id: EntityId,
    /// Path with a leading slash.
    pub path: String,
    /// Whether the blob store created a new blob.
    pub created_blob: bool,
}

/// Coordinates tree mutations with every companion service.
///
/// Public operations hold the `structure_update` lock of the project for
/// their whole duration.
#[derive(Debug, Clone)]
pub struct EntityUpdateHandler {
    /// Project store.
    pub(super) store: Arc<dyn ProjectStore>,
    /// Tree mutator.
    pub(super) mutator: TreeMutator,
    /// Resync reconciler.
    pub(super) reconciler: ResyncReconciler,
    /// Lock manager with the default hold timeout.
    pub(super) locks: LockManager,
    /// Lock manager with the extended resync hold timeout.
    pub(super) resync_locks: LockManager,
    /// Name validator.
    pub(super) validator: NameValidator,
    /// Companion services.
    pub(super) services: Collaborators,
}

impl EntityUpdateHandler {
    /// Creates a new handler.
    pub fn new(
        store: Arc<dyn ProjectStore>,
        locks: LockManager,
        config: &AppConfig,
        services: Collaborators,
    ) -> Self {
        let mutator = TreeMutator::new(Arc::clone(&store), locks.clone(), &config.project);
        let reconciler = ResyncReconciler::new(
            Arc::clone(&store),
            mutator.clone(),
            Arc::clone(&services.history),
        );
        Self {
            resync_locks: locks.with_timeout(config.lock.resync_timeout_seconds),
            validator: NameValidator::from_config(&config.project),
            store,
            mutator,
            reconciler,
            locks,
            services,
        }
    }

    /// The underlying tree mutator.
    pub fn mutator(&self) -> &TreeMutator {
        &self.mutator
    }

    /// Create a doc with `lines` in `folder_id`, or in the root folder.
    pub async fn add_doc(
        &self,
        project_id: ProjectId,
        folder_id: Option<EntityId>,
        name: &str,
        lines: Vec<String>,
        ctx: &RequestContext,
    ) -> AppResult<AddedDoc> {
        self.validator.validate(name)?;
        self.locks
            .run_with_lock(
                STRUCTURE_UPDATE,
                project_id,
                self.add_doc_locked(project_id, folder_id, name, lines, ctx),
            )
            .await
    }

    async fn add_doc_locked(
        &self,
        project_id: ProjectId,
        folder_id: Option<EntityId>,
        name: &str,
        lines: Vec<String>,
        ctx: &RequestContext,
    ) -> AppResult<AddedDoc> {
        let project = self.store.get(project_id).await?;
        self.mutator
            .check_insert(&project, folder_id, name, EntityType::Doc, true)?;

        let doc = Doc::new(name);
        self.services
            .content
            .update_doc(project_id, doc.id, &lines, 0, None)
            .await?;

        let added = self
            .mutator
            .add_doc(project_id, folder_id, doc.clone(), ctx)
            .await?;
        let path = added.path.file_system;
        let project = added.project;

        self.update_history(
            &project,
            ctx,
            ProjectStructureChanges::for_added_doc(&doc, &path, &lines, &project),
        )
        .await?;
        self.sync_add_doc(&project, doc.id, &path, doc.rev).await;
        self.emit(
            project_id,
            RoomEvent::ReceiveNewDoc {
                folder_id: added.parent_id,
                doc: doc.clone(),
                source: ctx.source.clone(),
            },
        )
        .await;

        info!(project_id = %project_id, doc_id = %doc.id, path = %path, "Doc added");
        Ok(AddedDoc {
            doc,
            folder_id: added.parent_id,
            path,
        })
    }

    /// Upload the file at `local_path` and add it to `folder_id`, or to the
    /// root folder.
    pub async fn add_file(
        &self,
        project_id: ProjectId,
        folder_id: Option<EntityId>,
        name: &str,
        local_path: &Path,
        linked_file_data: Option<serde_json::Value>,
        ctx: &RequestContext,
    ) -> AppResult<AddedFile> {
        self.validator.validate(name)?;
        self.locks
            .run_with_lock(
                STRUCTURE_UPDATE,
                project_id,
                self.add_file_locked(project_id, folder_id, name, local_path, linked_file_data, ctx),
            )
            .await
    }

    async fn add_file_locked(
        &self,
        project_id: ProjectId,
        folder_id: Option<EntityId>,
        name: &str,
        local_path: &Path,
        linked_file_data: Option<serde_json::Value>,
        ctx: &RequestContext,
    ) -> AppResult<AddedFile> {
        let project = self.store.get(project_id).await?;
        self.mutator
            .check_insert(&project, folder_id, name, EntityType::File, true)?;

        let uploaded = self
            .services
            .blobs
            .upload_file_from_disk(
                project_id,
                FileMeta {
                    name: name.to_string(),
                    rev: 0,
                    linked_file_data,
                },
                local_path,
            )
            .await?;
        let file = uploaded.file_ref;

        let added = self
            .mutator
            .add_file(project_id, folder_id, file.clone(), ctx)
            .await?;
        let path = added.path.file_system;
        let project = added.project;

        self.update_history(
            &project,
            ctx,
            ProjectStructureChanges::for_added_file(&file, &path, uploaded.created_blob, &project),
        )
        .await?;
        self.sync_add_file(&project, &file, &path).await;
        self.emit(
            project_id,
            RoomEvent::ReceiveNewFile {
                folder_id: added.parent_id,
                file: file.clone(),
                source: ctx.source.clone(),
                linked_file_data: file.linked_file_data.clone(),
            },
        )
        .await;

        info!(project_id = %project_id, file_id = %file.id, path = %path, "File added");
        Ok(AddedFile {
            file,
            folder_id: added.parent_id,
            path,
            created_blob: uploaded.created_blob,
        })
    }

    /// Create an empty folder in `parent_id`, or in the root folder.
    pub async fn add_folder(
        &self,
        project_id: ProjectId,
        parent_id: Option<EntityId>,
        name: &str,
        ctx: &RequestContext,
    ) -> AppResult<FolderAdded> {
        self.validator.validate(name)?;
        self.locks
            .run_with_lock(STRUCTURE_UPDATE, project_id, async {
                let added = self
                    .mutator
                    .add_folder(project_id, parent_id, name, ctx)
                    .await?;
                self.emit(
                    project_id,
                    RoomEvent::ReceiveNewFolder {
                        folder_id: added.parent_id,
                        folder: added.folder.clone(),
                    },
                )
                .await;
                Ok(added)
            })
            .await
    }

    /// Ensure every folder of `path` exists, matching existing folders on
    /// exact case.
    pub async fn mkdirp(
        &self,
        project_id: ProjectId,
        path: &str,
        ctx: &RequestContext,
    ) -> AppResult<MkdirpOutcome> {
        self.mkdirp_inner(project_id, path, true, ctx).await
    }

    /// Ensure every folder of `path` exists, reusing existing folders whose
    /// names differ only in case. Kept for legacy callers.
    pub async fn mkdirp_case_insensitive(
        &self,
        project_id: ProjectId,
        path: &str,
        ctx: &RequestContext,
    ) -> AppResult<MkdirpOutcome> {
        self.mkdirp_inner(project_id, path, false, ctx).await
    }

    async fn mkdirp_inner(
        &self,
        project_id: ProjectId,
        path: &str,
        exact_case: bool,
        ctx: &RequestContext,
    ) -> AppResult<MkdirpOutcome> {
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            self.validator.validate(segment)?;
        }
        self.locks
            .run_with_lock(STRUCTURE_UPDATE, project_id, async {
                let outcome = self
                    .mutator
                    .mkdirp(project_id, path, exact_case, ctx)
                    .await?;
                for created in &outcome.new_folders {
                    self.emit(
                        project_id,
                        RoomEvent::ReceiveNewFolder {
                            folder_id: created.parent_id,
                            folder: created.folder.clone(),
                        },
                    )
                    .await;
                }
                Ok(outcome)
            })
            .await
    }

    /// Move an entity into `destination_id`.
    pub async fn move_entity(
        &self,
        project_id: ProjectId,
        entity_id: EntityId,
        destination_id: EntityId,
        entity_type: EntityType,
        ctx: &RequestContext,
    ) -> AppResult<MoveOutcome> {
        self.locks
            .run_with_lock(STRUCTURE_UPDATE, project_id, async {
                let outcome = self
                    .mutator
                    .move_entity(project_id, entity_id, destination_id, entity_type, ctx)
                    .await?;
                self.sync_move(&outcome).await;
                self.update_history(&outcome.new_project, ctx, outcome.changes.clone())
                    .await?;
                self.emit(
                    project_id,
                    RoomEvent::ReceiveEntityMove {
                        id: entity_id,
                        folder_id: destination_id,
                    },
                )
                .await;
                Ok(outcome)
            })
            .await
    }

    /// Rename an entity in place.
    pub async fn rename_entity(
        &self,
        project_id: ProjectId,
        entity_id: EntityId,
        entity_type: EntityType,
        new_name: &str,
        ctx: &RequestContext,
    ) -> AppResult<MoveOutcome> {
        self.validator.validate(new_name)?;
        self.locks
            .run_with_lock(STRUCTURE_UPDATE, project_id, async {
                let outcome = self
                    .mutator
                    .rename_entity(project_id, entity_id, entity_type, new_name, ctx)
                    .await?;
                self.sync_move(&outcome).await;
                self.update_history(&outcome.new_project, ctx, outcome.changes.clone())
                    .await?;
                self.emit(
                    project_id,
                    RoomEvent::ReceiveEntityRename {
                        id: entity_id,
                        name: new_name.to_string(),
                    },
                )
                .await;
                Ok(outcome)
            })
            .await
    }

    /// Make `doc_id` the project's root doc.
    pub async fn set_root_doc(&self, project_id: ProjectId, doc_id: EntityId) -> AppResult<()> {
        let project = self.store.get(project_id).await?;
        find_element(&project, doc_id, EntityType::Doc)?;
        self.mutator.set_root_doc(project_id, Some(doc_id)).await?;
        info!(project_id = %project_id, doc_id = %doc_id, "Root doc set");
        Ok(())
    }

    /// Clear the project's root doc.
    pub async fn unset_root_doc(&self, project_id: ProjectId) -> AppResult<()> {
        self.mutator.set_root_doc(project_id, None).await?;
        info!(project_id = %project_id, "Root doc unset");
        Ok(())
    }

    /// Repair the tree and resynchronize the history service.
    pub async fn resync_project_history(
        &self,
        project_id: ProjectId,
        ctx: &RequestContext,
    ) -> AppResult<ResyncReport> {
        self.resync_locks
            .run_with_lock(
                STRUCTURE_UPDATE,
                project_id,
                self.reconciler.resync(project_id, ctx),
            )
            .await
    }

    pub(super) async fn update_history(
        &self,
        project: &Project,
        ctx: &RequestContext,
        changes: ProjectStructureChanges,
    ) -> AppResult<()> {
        self.services
            .history
            .update_project_structure(
                project.id,
                project.history_id(),
                ctx.user_id,
                changes,
                &ctx.source,
            )
            .await
    }

    pub(super) async fn emit(&self, project_id: ProjectId, event: RoomEvent) {
        let name = event.name();
        if let Err(e) = self.services.realtime.emit_to_room(project_id, event).await {
            warn!(project_id = %project_id, event = name, error = %e, "Failed to emit room event");
        }
    }

    pub(super) async fn sync_add_doc(&self, project: &Project, doc_id: EntityId, path: &str, rev: u64) {
        let update = TpdsAddDoc {
            project_id: project.id,
            doc_id,
            path: path.to_string(),
            project_name: project.name.clone(),
            rev,
        };
        if let Err(e) = self.services.tpds.add_doc(update).await {
            warn!(project_id = %project.id, doc_id = %doc_id, error = %e, "Failed to sync doc");
        }
    }

    pub(super) async fn sync_add_file(&self, project: &Project, file: &FileRef, path: &str) {
        let update = TpdsAddFile {
            project_id: project.id,
            file_id: file.id,
            path: path.to_string(),
            project_name: project.name.clone(),
            rev: file.rev,
            hash: file.hash.clone(),
        };
        if let Err(e) = self.services.tpds.add_file(update).await {
            warn!(project_id = %project.id, file_id = %file.id, error = %e, "Failed to sync file");
        }
    }

    async fn sync_move(&self, outcome: &MoveOutcome) {
        let project = &outcome.project_before;
        let update = TpdsMoveEntity {
            project_id: project.id,
            start_path: outcome.start_path.clone(),
            end_path: outcome.end_path.clone(),
            project_name: project.name.clone(),
            rev: outcome.rev,
        };
        if let Err(e) = self.services.tpds.move_entity(update).await {
            warn!(project_id = %project.id, error = %e, "Failed to sync move");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use projtree_core::error::ErrorKind;
    use projtree_core::types::id::UserId;
    use projtree_database::stores::memory::MemoryProjectStore;

    use crate::collaborators::memory::{
        MemoryBlobStore, MemoryContentStore, RecordingBroadcast, RecordingHistory,
        RecordingStructureSync, SyncCall,
    };

    pub(crate) struct Fixture {
        pub(crate) store: Arc<MemoryProjectStore>,
        pub(crate) handler: EntityUpdateHandler,
        pub(crate) project_id: ProjectId,
        pub(crate) ctx: RequestContext,
        pub(crate) content: Arc<MemoryContentStore>,
        pub(crate) blobs: Arc<MemoryBlobStore>,
        pub(crate) history: Arc<RecordingHistory>,
        pub(crate) tpds: Arc<RecordingStructureSync>,
        pub(crate) realtime: Arc<RecordingBroadcast>,
    }

    impl Fixture {
        pub(crate) async fn project(&self) -> Project {
            self.store.get(self.project_id).await.unwrap()
        }
    }

    pub(crate) async fn fixture() -> Fixture {
        let store = Arc::new(MemoryProjectStore::new());
        let project = Project::new("thesis", UserId::new()).with_history("h-1");
        store.insert(&project).await.unwrap();

        let content = Arc::new(MemoryContentStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let history = Arc::new(RecordingHistory::new());
        let tpds = Arc::new(RecordingStructureSync::new());
        let realtime = Arc::new(RecordingBroadcast::new());
        let services = Collaborators {
            content: content.clone(),
            blobs: blobs.clone(),
            history: history.clone(),
            realtime: realtime.clone(),
            tpds: tpds.clone(),
        };

        let config = AppConfig::default();
        let handler = EntityUpdateHandler::new(
            store.clone(),
            LockManager::new(&config.lock),
            &config,
            services,
        );

        Fixture {
            store,
            handler,
            project_id: project.id,
            ctx: RequestContext::new(UserId::new()),
            content,
            blobs,
            history,
            tpds,
            realtime,
        }
    }

    #[tokio::test]
    async fn test_add_doc_notifies_everyone() {
        let f = fixture().await;
        let added = f
            .handler
            .add_doc(
                f.project_id,
                None,
                "main.tex",
                vec!["\\documentclass{article}".to_string()],
                &f.ctx,
            )
            .await
            .unwrap();
        assert_eq!(added.path, "/main.tex");
        assert_eq!(f.content.live_doc_count(f.project_id), 1);

        let changes = f.history.structure_updates();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_docs[0].path, "/main.tex");
        assert_eq!(
            changes[0].new_docs[0].doc_lines.as_deref(),
            Some("\\documentclass{article}")
        );
        assert_eq!(changes[0].new_project.version, 1);

        assert!(matches!(f.tpds.calls()[0], SyncCall::AddDoc(_)));
        assert_eq!(f.realtime.event_names(), vec!["reciveNewDoc"]);
    }

    #[tokio::test]
    async fn test_invalid_name_fails_before_any_write() {
        let f = fixture().await;
        let err = f
            .handler
            .add_doc(f.project_id, None, "bad/name.tex", Vec::new(), &f.ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidName);
        assert_eq!(f.content.live_doc_count(f.project_id), 0);
        assert!(f.history.calls().is_empty());
        assert!(f.realtime.events().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_add_leaves_no_content_or_blob() {
        let f = fixture().await;
        f.handler
            .add_doc(f.project_id, None, "main.tex", vec!["a".to_string()], &f.ctx)
            .await
            .unwrap();

        let err = f
            .handler
            .add_doc(f.project_id, None, "main.tex", vec!["b".to_string()], &f.ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateName);
        assert_eq!(f.content.live_doc_count(f.project_id), 1);

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("main.tex");
        tokio::fs::write(&local, b"bytes").await.unwrap();
        let err = f
            .handler
            .add_file(f.project_id, None, "main.tex", &local, None, &f.ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateName);
        assert_eq!(f.blobs.blob_count(), 0);
        assert_eq!(f.history.structure_updates().len(), 1);
    }

    #[tokio::test]
    async fn test_add_file_uploads_blob() {
        let f = fixture().await;
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("plot.png");
        tokio::fs::write(&local, b"png-bytes").await.unwrap();

        let linked = serde_json::json!({ "provider": "url", "url": "https://example.org/plot.png" });
        let added = f
            .handler
            .add_file(f.project_id, None, "plot.png", &local, Some(linked.clone()), &f.ctx)
            .await
            .unwrap();
        assert!(added.created_blob);
        assert_eq!(added.file.linked_file_data, Some(linked));

        let changes = f.history.structure_updates();
        assert!(changes[0].new_files[0].created_blob);
        match &f.realtime.events()[0].1 {
            RoomEvent::ReceiveNewFile { file, .. } => assert_eq!(file.id, added.file.id),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mkdirp_emits_one_event_per_new_folder() {
        let f = fixture().await;
        let outcome = f
            .handler
            .mkdirp(f.project_id, "/a/b", &f.ctx)
            .await
            .unwrap();
        assert_eq!(outcome.new_folders.len(), 2);
        assert_eq!(f.realtime.event_names(), vec!["reciveNewFolder", "reciveNewFolder"]);

        f.handler
            .mkdirp_case_insensitive(f.project_id, "/A/b", &f.ctx)
            .await
            .unwrap();
        assert_eq!(f.realtime.events().len(), 2);

        f.handler.mkdirp(f.project_id, "/A", &f.ctx).await.unwrap();
        assert_eq!(f.realtime.events().len(), 3);

        let err = f
            .handler
            .mkdirp(f.project_id, "/a/b*c", &f.ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidName);
    }

    #[tokio::test]
    async fn test_move_and_rename() {
        let f = fixture().await;
        let folder = f
            .handler
            .add_folder(f.project_id, None, "chapters", &f.ctx)
            .await
            .unwrap();
        let doc = f
            .handler
            .add_doc(f.project_id, None, "intro.tex", Vec::new(), &f.ctx)
            .await
            .unwrap();

        let moved = f
            .handler
            .move_entity(
                f.project_id,
                doc.doc.id,
                folder.folder.id,
                EntityType::Doc,
                &f.ctx,
            )
            .await
            .unwrap();
        assert_eq!(moved.end_path, "/chapters/intro.tex");

        let renamed = f
            .handler
            .rename_entity(
                f.project_id,
                folder.folder.id,
                EntityType::Folder,
                "parts",
                &f.ctx,
            )
            .await
            .unwrap();
        assert_eq!(renamed.changes.new_docs[0].path, "/parts/intro.tex");

        let moves: Vec<(String, String)> = f
            .tpds
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                SyncCall::MoveEntity(update) => Some((update.start_path, update.end_path)),
                _ => None,
            })
            .collect();
        assert_eq!(
            moves,
            vec![
                ("/intro.tex".to_string(), "/chapters/intro.tex".to_string()),
                ("/chapters".to_string(), "/parts".to_string()),
            ]
        );
        assert_eq!(
            &f.realtime.event_names()[2..],
            &["reciveEntityMove", "reciveEntityRename"]
        );
    }

    #[tokio::test]
    async fn test_root_doc() {
        let f = fixture().await;
        let doc = f
            .handler
            .add_doc(f.project_id, None, "main.tex", Vec::new(), &f.ctx)
            .await
            .unwrap();

        let err = f
            .handler
            .set_root_doc(f.project_id, EntityId::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        f.handler.set_root_doc(f.project_id, doc.doc.id).await.unwrap();
        assert_eq!(f.project().await.root_doc_id, Some(doc.doc.id));
        f.handler.unset_root_doc(f.project_id).await.unwrap();
        assert_eq!(f.project().await.root_doc_id, None);
    }

    #[tokio::test]
    async fn test_resync_through_handler() {
        let f = fixture().await;
        f.handler
            .add_doc(f.project_id, None, "main.tex", Vec::new(), &f.ctx)
            .await
            .unwrap();
        let report = f
            .handler
            .resync_project_history(f.project_id, &RequestContext::system("resync"))
            .await
            .unwrap();
        assert!(report.renamed.is_empty());
        assert_eq!(report.docs[0].path, "main.tex");
    }
}
