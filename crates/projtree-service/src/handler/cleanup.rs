//! Deletion and the cleanup that follows it.

use tracing::{info, warn};

use projtree_core::error::AppError;
use projtree_core::result::AppResult;
use projtree_core::types::id::{EntityId, ProjectId};
use projtree_entity::{Doc, Entity, EntityType, FileRef, TreeEntity};
use projtree_lock::keys::STRUCTURE_UPDATE;

use super::service::EntityUpdateHandler;
use crate::context::RequestContext;
use crate::locator::find_element_by_path;
use crate::mutator::DeleteOutcome;
use crate::notifier::{ProjectStructureChanges, RoomEvent, TpdsDeleteEntity, subtree_listing};

impl EntityUpdateHandler {
    /// Delete an entity and everything below it. Returns the entity id.
    pub async fn delete_entity(
        &self,
        project_id: ProjectId,
        entity_id: EntityId,
        entity_type: EntityType,
        ctx: &RequestContext,
    ) -> AppResult<EntityId> {
        self.locks
            .run_with_lock(
                STRUCTURE_UPDATE,
                project_id,
                self.delete_locked(project_id, entity_id, entity_type, ctx),
            )
            .await
    }

    /// Delete the entity at `path` (exact case).
    pub async fn delete_entity_with_path(
        &self,
        project_id: ProjectId,
        path: &str,
        ctx: &RequestContext,
    ) -> AppResult<EntityId> {
        self.locks
            .run_with_lock(STRUCTURE_UPDATE, project_id, async {
                let project = self.store.get(project_id).await?;
                let found = find_element_by_path(&project, path, true)?;
                if found.path.locator.is_root() {
                    return Err(AppError::validation("cannot delete the root folder"));
                }
                self.delete_locked(project_id, found.element.id(), found.entity_type, ctx)
                    .await
            })
            .await
    }

    async fn delete_locked(
        &self,
        project_id: ProjectId,
        entity_id: EntityId,
        entity_type: EntityType,
        ctx: &RequestContext,
    ) -> AppResult<EntityId> {
        let outcome = self
            .mutator
            .delete_entity(project_id, entity_id, entity_type, ctx)
            .await?;
        self.clean_up_entity(&outcome, ctx).await?;
        self.emit(
            project_id,
            RoomEvent::RemoveEntity {
                id: entity_id,
                source: ctx.source.clone(),
            },
        )
        .await;
        Ok(entity_id)
    }

    /// Record removed docs and files, release their content, and tell the
    /// history service and third-party store.
    async fn clean_up_entity(&self, outcome: &DeleteOutcome, ctx: &RequestContext) -> AppResult<()> {
        let project_id = outcome.project_before.id;
        let subtree = subtree_listing(&outcome.entity, &outcome.path.file_system);

        let mut docs: Vec<Doc> = Vec::new();
        let mut files: Vec<FileRef> = Vec::new();
        for entry in &subtree {
            match &entry.entity {
                Entity::Doc(doc) => docs.push(doc.clone()),
                Entity::File(file) => files.push(file.clone()),
                Entity::Folder(_) => {}
            }
        }

        let unset_root_doc = outcome
            .project_before
            .root_doc_id
            .is_some_and(|root| docs.iter().any(|doc| doc.id == root));
        self.mutator
            .record_deletions(project_id, &docs, &files, unset_root_doc)
            .await?;

        for doc in &docs {
            if let Err(e) = self.services.content.delete_doc(project_id, doc.id).await {
                warn!(
                    project_id = %project_id,
                    doc_id = %doc.id,
                    error = %e,
                    "Failed to delete doc content"
                );
            }
        }

        self.update_history(
            &outcome.new_project,
            ctx,
            ProjectStructureChanges::for_deleted(&subtree, &outcome.new_project),
        )
        .await?;

        let descriptor = TpdsDeleteEntity::new(
            &outcome.project_before,
            &outcome.entity,
            &outcome.path.file_system,
        );
        if let Err(e) = self.services.tpds.delete_entity(descriptor).await {
            warn!(project_id = %project_id, error = %e, "Failed to sync deletion");
        }

        info!(
            project_id = %project_id,
            entity_id = %outcome.entity.id(),
            path = %outcome.path.file_system,
            docs = docs.len(),
            files = files.len(),
            "Entity cleaned up"
        );
        Ok(())
    }
}
