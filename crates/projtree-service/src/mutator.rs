//! Tree mutation primitives.
//!
//! Every operation reads the project, resolves positions, validates, and
//! then applies targeted [`TreeUpdate`]s whose locators the store re-checks.
//! All operations on one project are serialized through the `tree_update`
//! lock.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use projtree_core::config::ProjectLimitsConfig;
use projtree_core::error::{AppError, ErrorKind};
use projtree_core::result::AppResult;
use projtree_core::types::id::{EntityId, ProjectId};
use projtree_database::{ProjectStore, TreeOp, TreeUpdate};
use projtree_entity::{
    Collection, DeletedDocRef, DeletedFileRef, Doc, Entity, EntityPath, EntityType, FileRef,
    Folder, Project, TreeEntity,
};
use projtree_lock::LockManager;
use projtree_lock::keys::TREE_UPDATE;

use crate::context::RequestContext;
use crate::locator::{Located, find_element, find_element_by_path};
use crate::notifier::{ProjectStructureChanges, join_path, subtree_listing};
use crate::safe_path::{NameValidator, ensure_unique, is_blocked_filename};

/// Result of inserting a doc, file, or folder.
#[derive(Debug, Clone)]
pub struct AddOutcome {
    /// Where the new element lives.
    pub path: EntityPath,
    /// Id of the folder it was added to.
    pub parent_id: EntityId,
    /// Project after the insert.
    pub project: Project,
}

/// Result of creating a folder.
#[derive(Debug, Clone)]
pub struct FolderAdded {
    /// The new folder.
    pub folder: Folder,
    /// Id of the folder it was added to.
    pub parent_id: EntityId,
    /// Project after the insert.
    pub project: Project,
}

/// A folder created by `mkdirp`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFolder {
    /// The folder.
    pub folder: Folder,
    /// Id of the folder it was created in.
    pub parent_id: EntityId,
}

/// Result of `mkdirp`.
#[derive(Debug, Clone)]
pub struct MkdirpOutcome {
    /// The deepest folder of the path.
    pub folder: Folder,
    /// Id of its parent, absent when the path is `/`.
    pub parent_id: Option<EntityId>,
    /// Folders that had to be created, outermost first.
    pub new_folders: Vec<NewFolder>,
}

/// Result of a move or rename.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    /// Project before the change.
    pub project_before: Project,
    /// Path before the change.
    pub start_path: String,
    /// Path after the change.
    pub end_path: String,
    /// Revision of the entity (0 for folders).
    pub rev: u64,
    /// Docs and files under the entity at their old and new paths.
    pub changes: ProjectStructureChanges,
    /// Project after the change.
    pub new_project: Project,
}

/// Result of a deletion.
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    /// The removed entity, with its subtree.
    pub entity: Entity,
    /// Where it used to live.
    pub path: EntityPath,
    /// Project before the deletion.
    pub project_before: Project,
    /// Project after the deletion.
    pub new_project: Project,
}

/// Result of replacing a file with a new revision.
#[derive(Debug, Clone)]
pub struct ReplaceOutcome {
    /// The file as it was before.
    pub old_file: FileRef,
    /// Where the file lives.
    pub path: EntityPath,
    /// Project before the replacement.
    pub project_before: Project,
    /// Project after the replacement.
    pub new_project: Project,
}

/// Applies validated structural changes to project trees.
#[derive(Debug, Clone)]
pub struct TreeMutator {
    /// Project store.
    store: Arc<dyn ProjectStore>,
    /// Project lock manager.
    locks: LockManager,
    /// Name validator.
    validator: NameValidator,
    /// Maximum number of entities per project.
    max_entities: usize,
}

impl TreeMutator {
    /// Creates a new tree mutator.
    pub fn new(
        store: Arc<dyn ProjectStore>,
        locks: LockManager,
        limits: &ProjectLimitsConfig,
    ) -> Self {
        Self {
            store,
            locks,
            validator: NameValidator::from_config(limits),
            max_entities: limits.max_entities,
        }
    }

    /// The name validator in use.
    pub fn validator(&self) -> &NameValidator {
        &self.validator
    }

    /// Add a doc to `parent_id`, or to the root folder.
    pub async fn add_doc(
        &self,
        project_id: ProjectId,
        parent_id: Option<EntityId>,
        doc: Doc,
        ctx: &RequestContext,
    ) -> AppResult<AddOutcome> {
        self.locks
            .run_with_lock(
                TREE_UPDATE,
                project_id,
                self.add_locked(project_id, parent_id, Entity::Doc(doc), ctx),
            )
            .await
    }

    /// Add a file to `parent_id`, or to the root folder.
    pub async fn add_file(
        &self,
        project_id: ProjectId,
        parent_id: Option<EntityId>,
        file: FileRef,
        ctx: &RequestContext,
    ) -> AppResult<AddOutcome> {
        self.locks
            .run_with_lock(
                TREE_UPDATE,
                project_id,
                self.add_locked(project_id, parent_id, Entity::File(file), ctx),
            )
            .await
    }

    /// Create an empty folder named `name` in `parent_id`, or in the root.
    pub async fn add_folder(
        &self,
        project_id: ProjectId,
        parent_id: Option<EntityId>,
        name: &str,
        ctx: &RequestContext,
    ) -> AppResult<FolderAdded> {
        let folder = Folder::new(name);
        let added = self
            .locks
            .run_with_lock(
                TREE_UPDATE,
                project_id,
                self.add_locked(project_id, parent_id, Entity::Folder(folder.clone()), ctx),
            )
            .await?;
        Ok(FolderAdded {
            folder,
            parent_id: added.parent_id,
            project: added.project,
        })
    }

    async fn add_locked(
        &self,
        project_id: ProjectId,
        parent_id: Option<EntityId>,
        entity: Entity,
        ctx: &RequestContext,
    ) -> AppResult<AddOutcome> {
        let project = self.store.get(project_id).await?;
        self.put_element(&project, parent_id, entity, ctx, true).await
    }

    /// Run every check an insert of `name` into `parent_id` (or the root
    /// folder) would make, without writing anything.
    ///
    /// Checks run in a fixed order: name, entity limit, parent, path length,
    /// reserved top-level names, sibling uniqueness. Returns the parent and
    /// the path the new element would have.
    pub fn check_insert(
        &self,
        project: &Project,
        parent_id: Option<EntityId>,
        name: &str,
        entity_type: EntityType,
        check_limit: bool,
    ) -> AppResult<(Located, String)> {
        self.validator.validate(name)?;

        if check_limit && project.entity_count() >= self.max_entities {
            return Err(AppError::entity_limit_exceeded(format!(
                "project {} already has {} entities",
                project.id, self.max_entities
            )));
        }

        let parent_id = parent_id.unwrap_or(project.root_folder.id);
        let parent = find_element(project, parent_id, EntityType::Folder)?;

        let file_system = join_path(&parent.path.file_system, name);
        if !self.validator.is_allowed_length(&file_system) {
            return Err(AppError::invalid_name("path too long"));
        }

        if parent.path.locator.is_root()
            && entity_type != EntityType::Folder
            && is_blocked_filename(name)
        {
            return Err(AppError::invalid_name("blocked element name"));
        }

        ensure_unique(expect_folder(&parent)?, name)?;
        Ok((parent, file_system))
    }

    /// Validate and insert `entity` below `parent_id`.
    async fn put_element(
        &self,
        project: &Project,
        parent_id: Option<EntityId>,
        entity: Entity,
        ctx: &RequestContext,
        check_limit: bool,
    ) -> AppResult<AddOutcome> {
        let name = entity.name().to_string();
        let entity_type = entity.entity_type();
        let (parent, file_system) =
            self.check_insert(project, parent_id, &name, entity_type, check_limit)?;
        let parent_id = parent.element.id();
        let parent_folder = expect_folder(&parent)?;

        let collection = Collection::from(entity_type);
        let index = match collection {
            Collection::Docs => parent_folder.docs.len(),
            Collection::FileRefs => parent_folder.file_refs.len(),
            Collection::Folders => parent_folder.folders.len(),
        };
        let locator = parent.path.locator.child(collection, index);

        let update = TreeUpdate::structural(vec![TreeOp::PushEntity {
            folder: parent.path.locator.clone(),
            folder_id: parent_id,
            entity,
        }])
        .touched_by(ctx.user_id);
        let new_project = self.store.apply_update(project.id, &update).await?;

        info!(
            project_id = %project.id,
            entity_type = %entity_type,
            path = %file_system,
            version = new_project.version,
            "Entity added"
        );

        Ok(AddOutcome {
            path: EntityPath {
                file_system,
                locator,
            },
            parent_id,
            project: new_project,
        })
    }

    /// Ensure every folder along `path` exists, creating missing ones.
    ///
    /// `/` returns the root folder and creates nothing. Repeating a call
    /// creates nothing the second time.
    pub async fn mkdirp(
        &self,
        project_id: ProjectId,
        path: &str,
        exact_case: bool,
        ctx: &RequestContext,
    ) -> AppResult<MkdirpOutcome> {
        self.locks
            .run_with_lock(
                TREE_UPDATE,
                project_id,
                self.mkdirp_locked(project_id, path, exact_case, ctx),
            )
            .await
    }

    async fn mkdirp_locked(
        &self,
        project_id: ProjectId,
        path: &str,
        exact_case: bool,
        ctx: &RequestContext,
    ) -> AppResult<MkdirpOutcome> {
        let mut project = self.store.get(project_id).await?;
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut current = project.root_folder.clone();
        let mut parent_id = None;
        let mut new_folders = Vec::new();
        let mut built = String::new();

        for segment in segments {
            built.push('/');
            built.push_str(segment);

            match find_element_by_path(&project, &built, exact_case) {
                Ok(found) => match found.element {
                    Entity::Folder(folder) => {
                        parent_id = found.parent_id;
                        current = folder;
                    }
                    _ => return Err(AppError::duplicate_name("file already exists")),
                },
                Err(e) if e.is(ErrorKind::NotFound) => {
                    let folder = Folder::new(segment);
                    let added = self
                        .put_element(
                            &project,
                            Some(current.id),
                            Entity::Folder(folder.clone()),
                            ctx,
                            true,
                        )
                        .await?;
                    project = added.project;
                    parent_id = Some(current.id);
                    new_folders.push(NewFolder {
                        folder: folder.clone(),
                        parent_id: current.id,
                    });
                    current = folder;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(MkdirpOutcome {
            folder: current,
            parent_id,
            new_folders,
        })
    }

    /// Move an entity into `destination_id`.
    ///
    /// The entity is inserted at the destination first and then pulled from
    /// its old position, as two separate updates.
    pub async fn move_entity(
        &self,
        project_id: ProjectId,
        entity_id: EntityId,
        destination_id: EntityId,
        entity_type: EntityType,
        ctx: &RequestContext,
    ) -> AppResult<MoveOutcome> {
        self.locks
            .run_with_lock(
                TREE_UPDATE,
                project_id,
                self.move_locked(project_id, entity_id, destination_id, entity_type, ctx),
            )
            .await
    }

    async fn move_locked(
        &self,
        project_id: ProjectId,
        entity_id: EntityId,
        destination_id: EntityId,
        entity_type: EntityType,
        ctx: &RequestContext,
    ) -> AppResult<MoveOutcome> {
        let project = self.store.get(project_id).await?;
        let located = find_element(&project, entity_id, entity_type)?;
        if located.path.locator.is_root() {
            return Err(AppError::invalid_name("cannot move the root folder"));
        }

        let destination = find_element(&project, destination_id, EntityType::Folder)?;
        let destination_folder = expect_folder(&destination)?;
        let name = located.element.name();

        if entity_type == EntityType::Folder
            && is_same_or_below(&destination.path.file_system, &located.path.file_system)
        {
            return Err(AppError::invalid_name(
                "destination folder is a child folder of me",
            ));
        }
        if destination.path.locator.is_root()
            && entity_type != EntityType::Folder
            && is_blocked_filename(name)
        {
            return Err(AppError::invalid_name("blocked element name"));
        }
        ensure_unique(destination_folder, name)?;

        let added = self
            .put_element(
                &project,
                Some(destination_id),
                located.element.clone(),
                ctx,
                false,
            )
            .await?;

        // The insert already bumped the version.
        let pull = TreeUpdate::metadata(vec![TreeOp::PullEntity {
            locator: located.path.locator.clone(),
            entity_id,
        }])
        .touched_by(ctx.user_id);
        let new_project = self.store.apply_update(project_id, &pull).await?;

        if project.root_folder.count_docs_and_files() != new_project.root_folder.count_docs_and_files()
        {
            warn!(
                project_id = %project_id,
                entity_id = %entity_id,
                "Doc or file count changed during move"
            );
            return Err(AppError::internal("unexpected change in project structure"));
        }

        let start_path = located.path.file_system.clone();
        let end_path = added.path.file_system;
        let changes = ProjectStructureChanges::for_move(
            &subtree_listing(&located.element, &start_path),
            &subtree_listing(&located.element, &end_path),
            &new_project,
        );

        info!(
            project_id = %project_id,
            entity_id = %entity_id,
            from = %start_path,
            to = %end_path,
            "Entity moved"
        );

        Ok(MoveOutcome {
            rev: entity_rev(&located.element),
            project_before: project,
            start_path,
            end_path,
            changes,
            new_project,
        })
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
        self.locks
            .run_with_lock(
                TREE_UPDATE,
                project_id,
                self.rename_locked(project_id, entity_id, entity_type, new_name, ctx),
            )
            .await
    }

    async fn rename_locked(
        &self,
        project_id: ProjectId,
        entity_id: EntityId,
        entity_type: EntityType,
        new_name: &str,
        ctx: &RequestContext,
    ) -> AppResult<MoveOutcome> {
        let project = self.store.get(project_id).await?;
        let located = find_element(&project, entity_id, entity_type)?;
        let parent_id = located
            .parent_id
            .ok_or_else(|| AppError::invalid_name("cannot rename the root folder"))?;
        let parent = find_element(&project, parent_id, EntityType::Folder)?;

        if parent.path.locator.is_root()
            && entity_type != EntityType::Folder
            && is_blocked_filename(new_name)
        {
            return Err(AppError::invalid_name("blocked element name"));
        }
        ensure_unique(expect_folder(&parent)?, new_name)?;

        let update = TreeUpdate::structural(vec![TreeOp::RenameEntity {
            locator: located.path.locator.clone(),
            entity_id,
            name: new_name.to_string(),
        }])
        .touched_by(ctx.user_id);
        let new_project = self.store.apply_update(project_id, &update).await?;

        let mut renamed = located.element.clone();
        renamed.set_name(new_name);
        let start_path = located.path.file_system.clone();
        let end_path = join_path(&parent.path.file_system, new_name);
        let changes = ProjectStructureChanges::for_move(
            &subtree_listing(&located.element, &start_path),
            &subtree_listing(&renamed, &end_path),
            &new_project,
        );

        info!(
            project_id = %project_id,
            entity_id = %entity_id,
            from = %start_path,
            to = %end_path,
            "Entity renamed"
        );

        Ok(MoveOutcome {
            rev: entity_rev(&located.element),
            project_before: project,
            start_path,
            end_path,
            changes,
            new_project,
        })
    }

    /// Remove an entity, and for folders everything below it.
    pub async fn delete_entity(
        &self,
        project_id: ProjectId,
        entity_id: EntityId,
        entity_type: EntityType,
        ctx: &RequestContext,
    ) -> AppResult<DeleteOutcome> {
        self.locks
            .run_with_lock(
                TREE_UPDATE,
                project_id,
                self.delete_locked(project_id, entity_id, entity_type, ctx),
            )
            .await
    }

    async fn delete_locked(
        &self,
        project_id: ProjectId,
        entity_id: EntityId,
        entity_type: EntityType,
        ctx: &RequestContext,
    ) -> AppResult<DeleteOutcome> {
        let project = self.store.get(project_id).await?;
        let located = find_element(&project, entity_id, entity_type)?;
        if located.path.locator.is_root() {
            return Err(AppError::validation("cannot delete the root folder"));
        }

        let update = TreeUpdate::structural(vec![TreeOp::PullEntity {
            locator: located.path.locator.clone(),
            entity_id,
        }])
        .touched_by(ctx.user_id);
        let new_project = self.store.apply_update(project_id, &update).await?;

        info!(
            project_id = %project_id,
            entity_id = %entity_id,
            entity_type = %entity_type,
            path = %located.path.file_system,
            "Entity deleted"
        );

        Ok(DeleteOutcome {
            entity: located.element,
            path: located.path,
            project_before: project,
            new_project,
        })
    }

    /// Swap a doc for a file at the same position in one update.
    pub async fn replace_doc_with_file(
        &self,
        project_id: ProjectId,
        doc_id: EntityId,
        file: FileRef,
        ctx: &RequestContext,
    ) -> AppResult<Project> {
        self.locks
            .run_with_lock(
                TREE_UPDATE,
                project_id,
                self.swap_locked(project_id, doc_id, EntityType::Doc, Entity::File(file), ctx),
            )
            .await
    }

    /// Swap a file for a doc at the same position in one update.
    pub async fn replace_file_with_doc(
        &self,
        project_id: ProjectId,
        file_id: EntityId,
        doc: Doc,
        ctx: &RequestContext,
    ) -> AppResult<Project> {
        self.locks
            .run_with_lock(
                TREE_UPDATE,
                project_id,
                self.swap_locked(project_id, file_id, EntityType::File, Entity::Doc(doc), ctx),
            )
            .await
    }

    async fn swap_locked(
        &self,
        project_id: ProjectId,
        old_id: EntityId,
        old_type: EntityType,
        replacement: Entity,
        ctx: &RequestContext,
    ) -> AppResult<Project> {
        let project = self.store.get(project_id).await?;
        let located = find_element(&project, old_id, old_type)?;
        let (parent_locator, parent_id) = match (located.path.locator.parent(), located.parent_id)
        {
            (Some(locator), Some(id)) => (locator, id),
            _ => return Err(AppError::internal("element has no parent folder")),
        };

        let replacement_type = replacement.entity_type();
        let update = TreeUpdate::structural(vec![
            TreeOp::PullEntity {
                locator: located.path.locator.clone(),
                entity_id: old_id,
            },
            TreeOp::PushEntity {
                folder: parent_locator,
                folder_id: parent_id,
                entity: replacement,
            },
        ])
        .touched_by(ctx.user_id);
        let new_project = self.store.apply_update(project_id, &update).await?;

        info!(
            project_id = %project_id,
            entity_id = %old_id,
            from = %old_type,
            to = %replacement_type,
            "Entity replaced"
        );
        Ok(new_project)
    }

    /// Replace a file with a new revision in place.
    ///
    /// The old file is recorded as a deleted file reference; the position
    /// keeps its name and gets the new id, hash, provenance and creation
    /// time, with `rev` incremented.
    pub async fn replace_file_with_new(
        &self,
        project_id: ProjectId,
        file_id: EntityId,
        new_file: FileRef,
        ctx: &RequestContext,
    ) -> AppResult<ReplaceOutcome> {
        self.locks
            .run_with_lock(
                TREE_UPDATE,
                project_id,
                self.replace_file_locked(project_id, file_id, new_file, ctx),
            )
            .await
    }

    async fn replace_file_locked(
        &self,
        project_id: ProjectId,
        file_id: EntityId,
        new_file: FileRef,
        ctx: &RequestContext,
    ) -> AppResult<ReplaceOutcome> {
        let project = self.store.get(project_id).await?;
        let located = find_element(&project, file_id, EntityType::File)?;
        let old_file = located
            .element
            .as_file()
            .cloned()
            .ok_or_else(|| AppError::internal("located element is not a file"))?;

        let update = TreeUpdate::structural(vec![
            TreeOp::PushDeletedFile {
                file: DeletedFileRef::from_file(&old_file, Utc::now()),
            },
            TreeOp::ReplaceFile {
                locator: located.path.locator.clone(),
                entity_id: file_id,
                file: new_file,
            },
        ])
        .touched_by(ctx.user_id);
        let new_project = self.store.apply_update(project_id, &update).await?;

        info!(project_id = %project_id, file_id = %file_id, "File replaced with new revision");
        Ok(ReplaceOutcome {
            old_file,
            path: located.path,
            project_before: project,
            new_project,
        })
    }

    /// Install `root_folder` as the whole tree of an empty project.
    ///
    /// Fails with `Conflict` when the project already has content. Returns
    /// the new project version.
    pub async fn create_new_folder_structure(
        &self,
        project_id: ProjectId,
        root_folder: Folder,
        ctx: &RequestContext,
    ) -> AppResult<u64> {
        let update = TreeUpdate::structural(vec![TreeOp::ReplaceRootFolder {
            folder: root_folder,
        }])
        .touched_by(ctx.user_id);
        let project = self
            .locks
            .run_with_lock(
                TREE_UPDATE,
                project_id,
                self.store.apply_update(project_id, &update),
            )
            .await?;
        info!(project_id = %project_id, version = project.version, "Folder structure created");
        Ok(project.version)
    }

    /// Record `doc` as deleted.
    pub async fn insert_deleted_doc_reference(
        &self,
        project_id: ProjectId,
        doc: &Doc,
    ) -> AppResult<()> {
        let update = TreeUpdate::metadata(vec![TreeOp::PushDeletedDoc {
            doc: DeletedDocRef {
                id: doc.id,
                name: doc.name.clone(),
                deleted_at: Utc::now(),
            },
        }]);
        self.apply_metadata(project_id, update).await
    }

    /// Record `file` as deleted.
    pub async fn insert_deleted_file_reference(
        &self,
        project_id: ProjectId,
        file: &FileRef,
    ) -> AppResult<()> {
        let update = TreeUpdate::metadata(vec![TreeOp::PushDeletedFile {
            file: DeletedFileRef::from_file(file, Utc::now()),
        }]);
        self.apply_metadata(project_id, update).await
    }

    /// Record a batch of removed docs and files in one update, clearing the
    /// root doc when it is among them.
    pub async fn record_deletions(
        &self,
        project_id: ProjectId,
        docs: &[Doc],
        files: &[FileRef],
        unset_root_doc: bool,
    ) -> AppResult<()> {
        let now = Utc::now();
        let mut ops: Vec<TreeOp> = Vec::with_capacity(docs.len() + files.len() + 1);
        if unset_root_doc {
            ops.push(TreeOp::SetRootDoc { doc_id: None });
        }
        ops.extend(docs.iter().map(|doc| TreeOp::PushDeletedDoc {
            doc: DeletedDocRef {
                id: doc.id,
                name: doc.name.clone(),
                deleted_at: now,
            },
        }));
        ops.extend(files.iter().map(|file| TreeOp::PushDeletedFile {
            file: DeletedFileRef::from_file(file, now),
        }));
        if ops.is_empty() {
            return Ok(());
        }
        self.apply_metadata(project_id, TreeUpdate::metadata(ops)).await
    }

    /// Set or clear the root doc.
    pub async fn set_root_doc(
        &self,
        project_id: ProjectId,
        doc_id: Option<EntityId>,
    ) -> AppResult<()> {
        let update = TreeUpdate::metadata(vec![TreeOp::SetRootDoc { doc_id }]);
        self.apply_metadata(project_id, update).await
    }

    /// Stamp the project as updated by the acting user.
    pub async fn mark_as_updated(&self, project_id: ProjectId, ctx: &RequestContext) -> AppResult<()> {
        let update = TreeUpdate::metadata(Vec::new()).touched_by(ctx.user_id);
        self.apply_metadata(project_id, update).await
    }

    async fn apply_metadata(&self, project_id: ProjectId, update: TreeUpdate) -> AppResult<()> {
        self.locks
            .run_with_lock(
                TREE_UPDATE,
                project_id,
                self.store.apply_update(project_id, &update),
            )
            .await
            .map(|_| ())
    }
}

fn expect_folder(located: &Located) -> AppResult<&Folder> {
    located
        .element
        .as_folder()
        .ok_or_else(|| AppError::internal("located element is not a folder"))
}

fn entity_rev(entity: &Entity) -> u64 {
    match entity {
        Entity::Doc(doc) => doc.rev,
        Entity::File(file) => file.rev,
        Entity::Folder(_) => 0,
    }
}

/// Whether `path` is `ancestor` or lies below it, comparing whole segments.
fn is_same_or_below(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}
