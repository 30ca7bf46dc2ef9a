//! In-memory application of [`TreeUpdate`]s.
//!
//! Both backends load the project document, run it through
//! [`apply_update`], and persist the result only when every operation
//! succeeded.

use projtree_core::error::AppError;
use projtree_core::result::AppResult;
use projtree_core::types::id::EntityId;
use projtree_entity::{Collection, Entity, Folder, Locator, Project};

use super::model::{TreeOp, TreeUpdate};

/// Apply `update` to `project` in place.
///
/// Fails with `Conflict` when a locator no longer designates the expected
/// element. On error `project` may be partially modified; callers apply to
/// a copy.
pub fn apply_update(project: &mut Project, update: &TreeUpdate) -> AppResult<()> {
    for op in &update.ops {
        apply_op(project, op)?;
    }

    if update.increment_version {
        project.version += 1;
    }
    if let Some(touch) = &update.touched {
        project.last_updated = touch.at;
        project.last_updated_by = touch.by;
    }
    Ok(())
}

fn apply_op(project: &mut Project, op: &TreeOp) -> AppResult<()> {
    match op {
        TreeOp::PushEntity {
            folder,
            folder_id,
            entity,
        } => {
            let target = folder_checked(project, folder, *folder_id)?;
            match entity.clone() {
                Entity::Doc(doc) => target.docs.push(doc),
                Entity::File(file) => target.file_refs.push(file),
                Entity::Folder(child) => target.folders.push(child),
            }
        }
        TreeOp::PullEntity { locator, entity_id } => {
            let (parent, step_collection, index) = parent_checked(project, locator, *entity_id)?;
            match step_collection {
                Collection::Docs => {
                    parent.docs.remove(index);
                }
                Collection::FileRefs => {
                    parent.file_refs.remove(index);
                }
                Collection::Folders => {
                    parent.folders.remove(index);
                }
            }
        }
        TreeOp::RenameEntity {
            locator,
            entity_id,
            name,
        } => {
            if locator.is_root() {
                let root = folder_checked(project, locator, *entity_id)?;
                root.name = name.clone();
                return Ok(());
            }
            let (parent, collection, index) = parent_checked(project, locator, *entity_id)?;
            match collection {
                Collection::Docs => parent.docs[index].name = name.clone(),
                Collection::FileRefs => parent.file_refs[index].name = name.clone(),
                Collection::Folders => parent.folders[index].name = name.clone(),
            }
        }
        TreeOp::ReplaceFile {
            locator,
            entity_id,
            file,
        } => {
            let (parent, collection, index) = parent_checked(project, locator, *entity_id)?;
            if collection != Collection::FileRefs {
                return Err(no_match(locator));
            }
            let current = &mut parent.file_refs[index];
            current.id = file.id;
            current.hash = file.hash.clone();
            current.linked_file_data = file.linked_file_data.clone();
            current.created = file.created;
            current.rev += 1;
        }
        TreeOp::ReplaceRootFolder { folder } => {
            if !project.root_folder.is_empty() {
                return Err(AppError::conflict(format!(
                    "no document matched: project {} already has a folder structure",
                    project.id
                )));
            }
            project.root_folder = folder.clone();
        }
        TreeOp::PushDeletedDoc { doc } => project.deleted_docs.push(doc.clone()),
        TreeOp::PushDeletedFile { file } => project.deleted_files.push(file.clone()),
        TreeOp::SetRootDoc { doc_id } => project.root_doc_id = *doc_id,
    }
    Ok(())
}

fn no_match(locator: &Locator) -> AppError {
    AppError::conflict(format!("no document matched at {locator}"))
}

/// Resolve a folder locator and check the folder id.
fn folder_checked<'a>(
    project: &'a mut Project,
    locator: &Locator,
    expected: EntityId,
) -> AppResult<&'a mut Folder> {
    match project.folder_at_mut(locator) {
        Some(folder) if folder.id == expected => Ok(folder),
        _ => Err(no_match(locator)),
    }
}

/// Resolve the parent of an element locator and check the element id.
/// Returns the parent folder with the collection and index of the element.
fn parent_checked<'a>(
    project: &'a mut Project,
    locator: &Locator,
    expected: EntityId,
) -> AppResult<(&'a mut Folder, Collection, usize)> {
    let (step, parent_locator) = match (locator.last(), locator.parent()) {
        (Some(step), Some(parent)) => (*step, parent),
        _ => {
            return Err(AppError::validation(format!(
                "operation cannot target the root folder ({locator})"
            )));
        }
    };
    let parent = project
        .folder_at_mut(&parent_locator)
        .ok_or_else(|| no_match(locator))?;

    let found = match step.collection {
        Collection::Docs => parent.docs.get(step.index).map(|d| d.id),
        Collection::FileRefs => parent.file_refs.get(step.index).map(|f| f.id),
        Collection::Folders => parent.folders.get(step.index).map(|f| f.id),
    };
    if found != Some(expected) {
        return Err(no_match(locator));
    }
    Ok((parent, step.collection, step.index))
}
