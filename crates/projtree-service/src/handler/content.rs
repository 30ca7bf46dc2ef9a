//! Operations that touch doc content: line updates and doc-to-file
//! conversion.

use tracing::{debug, info};

use projtree_core::error::{AppError, ErrorKind};
use projtree_core::result::AppResult;
use projtree_core::types::id::{EntityId, ProjectId};
use projtree_entity::{EntityType, FileRef};
use projtree_lock::keys::STRUCTURE_UPDATE;

use super::service::EntityUpdateHandler;
use crate::collaborators::FileMeta;
use crate::context::RequestContext;
use crate::locator::find_element;
use crate::notifier::{DocChange, FileChange, ProjectStructureChanges, RoomEvent};

impl EntityUpdateHandler {
    /// Write new lines for a doc.
    ///
    /// Docs that were already deleted still get their content written, but
    /// nothing else is told about the change.
    pub async fn update_doc_lines(
        &self,
        project_id: ProjectId,
        doc_id: EntityId,
        lines: Vec<String>,
        version: u64,
        ranges: Option<serde_json::Value>,
        ctx: &RequestContext,
    ) -> AppResult<()> {
        let project = self.store.get(project_id).await?;
        let path = match find_element(&project, doc_id, EntityType::Doc) {
            Ok(located) => Some(located.path.file_system),
            Err(e) if e.is(ErrorKind::NotFound) => {
                let deleted = project.deleted_docs.iter().any(|d| d.id == doc_id)
                    || self
                        .services
                        .content
                        .is_doc_deleted(project_id, doc_id)
                        .await?;
                if !deleted {
                    return Err(AppError::not_found("doc not found"));
                }
                None
            }
            Err(e) => return Err(e),
        };

        let write = self
            .services
            .content
            .update_doc(project_id, doc_id, &lines, version, ranges.as_ref())
            .await?;

        let Some(path) = path else {
            debug!(project_id = %project_id, doc_id = %doc_id, "Updated lines of a deleted doc");
            return Ok(());
        };

        if write.modified {
            self.mutator.mark_as_updated(project_id, ctx).await?;
            self.sync_add_doc(&project, doc_id, &path, write.rev).await;
            info!(project_id = %project_id, doc_id = %doc_id, rev = write.rev, "Doc lines updated");
        }
        Ok(())
    }

    /// Turn a doc into a binary file holding its current lines.
    ///
    /// Fails with `DocHasRanges` when the doc carries tracked changes or
    /// comments.
    pub async fn convert_doc_to_file(
        &self,
        project_id: ProjectId,
        doc_id: EntityId,
        ctx: &RequestContext,
    ) -> AppResult<FileRef> {
        self.locks
            .run_with_lock(
                STRUCTURE_UPDATE,
                project_id,
                self.convert_locked(project_id, doc_id, ctx),
            )
            .await
    }

    async fn convert_locked(
        &self,
        project_id: ProjectId,
        doc_id: EntityId,
        ctx: &RequestContext,
    ) -> AppResult<FileRef> {
        let project = self.store.get(project_id).await?;
        let located = find_element(&project, doc_id, EntityType::Doc)?;
        let doc = located
            .element
            .as_doc()
            .cloned()
            .ok_or_else(|| AppError::internal("located element is not a doc"))?;
        let folder_id = located
            .parent_id
            .ok_or_else(|| AppError::internal("doc has no parent folder"))?;

        let stored = self.services.content.get_doc(project_id, doc_id).await?;
        if stored.has_ranges() {
            return Err(AppError::doc_has_ranges(format!(
                "doc {doc_id} has tracked changes or comments"
            )));
        }
        self.services.content.delete_doc(project_id, doc_id).await?;

        // Removed when `temp` drops, on every path out of this function.
        let temp = tempfile::Builder::new()
            .prefix(&format!("projtree-{doc_id}-"))
            .tempfile()?;
        tokio::fs::write(temp.path(), stored.lines.join("\n")).await?;
        let uploaded = self
            .services
            .blobs
            .upload_file_from_disk(
                project_id,
                FileMeta {
                    name: doc.name.clone(),
                    rev: doc.rev + 1,
                    linked_file_data: None,
                },
                temp.path(),
            )
            .await?;
        let file = uploaded.file_ref;

        let new_project = self
            .mutator
            .replace_doc_with_file(project_id, doc_id, file.clone(), ctx)
            .await?;

        let path = located.path.file_system;
        let changes = ProjectStructureChanges {
            old_docs: vec![DocChange {
                doc: doc.clone(),
                path: path.clone(),
                doc_lines: None,
            }],
            new_files: vec![FileChange {
                file: file.clone(),
                path: path.clone(),
                created_blob: uploaded.created_blob,
            }],
            ..ProjectStructureChanges::empty(&new_project)
        };
        self.update_history(&new_project, ctx, changes).await?;

        self.emit(
            project_id,
            RoomEvent::RemoveEntity {
                id: doc_id,
                source: ctx.source.clone(),
            },
        )
        .await;
        self.emit(
            project_id,
            RoomEvent::ReceiveNewFile {
                folder_id,
                file: file.clone(),
                source: ctx.source.clone(),
                linked_file_data: None,
            },
        )
        .await;

        info!(
            project_id = %project_id,
            doc_id = %doc_id,
            file_id = %file.id,
            path = %path,
            "Doc converted to file"
        );
        Ok(file)
    }
}
