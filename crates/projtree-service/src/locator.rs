//! Path resolution inside a project tree.
//!
//! Lookups walk the in-memory tree and report both the user-facing path and
//! the positional [`Locator`] of the element, which callers hand to the
//! store as the target of a targeted update.

use projtree_core::error::AppError;
use projtree_core::result::AppResult;
use projtree_core::types::id::EntityId;
use projtree_entity::{
    Collection, Entity, EntityPath, EntityType, Folder, Locator, Project, TreeEntity,
};

/// An element found by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    /// The element (folders include their subtree).
    pub element: Entity,
    /// Id of the containing folder, absent for the root folder.
    pub parent_id: Option<EntityId>,
    /// Path and locator of the element.
    pub path: EntityPath,
}

/// An element found by filesystem path.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedByPath {
    /// The element.
    pub element: Entity,
    /// Kind of the element.
    pub entity_type: EntityType,
    /// Id of the containing folder, absent for the root folder.
    pub parent_id: Option<EntityId>,
    /// Path and locator of the element.
    pub path: EntityPath,
}

/// Find an element by id and type.
///
/// Searching for a folder with the root folder's id returns the root with
/// path `/`. Fails with `NotFound` when no element of that type has the id.
pub fn find_element(
    project: &Project,
    element_id: EntityId,
    entity_type: EntityType,
) -> AppResult<Located> {
    let root = &project.root_folder;
    if entity_type == EntityType::Folder && root.id == element_id {
        return Ok(Located {
            element: Entity::Folder(root.clone()),
            parent_id: None,
            path: EntityPath::root(),
        });
    }

    search(root, &EntityPath::root(), element_id, entity_type).ok_or_else(|| {
        AppError::not_found(format!("{entity_type} {element_id} not found"))
    })
}

fn search(
    folder: &Folder,
    folder_path: &EntityPath,
    element_id: EntityId,
    entity_type: EntityType,
) -> Option<Located> {
    let hit = match entity_type {
        EntityType::Doc => position(&folder.docs, element_id)
            .map(|i| (i, Entity::Doc(folder.docs[i].clone()))),
        EntityType::File => position(&folder.file_refs, element_id)
            .map(|i| (i, Entity::File(folder.file_refs[i].clone()))),
        EntityType::Folder => position(&folder.folders, element_id)
            .map(|i| (i, Entity::Folder(folder.folders[i].clone()))),
    };
    if let Some((index, element)) = hit {
        let locator = folder_path
            .locator
            .child(Collection::from(entity_type), index);
        return Some(Located {
            path: folder_path.join(element.name(), locator),
            element,
            parent_id: Some(folder.id),
        });
    }

    folder.folders.iter().enumerate().find_map(|(index, child)| {
        let child_path = folder_path.join(
            &child.name,
            folder_path.locator.child(Collection::Folders, index),
        );
        search(child, &child_path, element_id, entity_type)
    })
}

fn position<T: TreeEntity>(items: &[T], element_id: EntityId) -> Option<usize> {
    items.iter().position(|item| item.id() == element_id)
}

/// Find an element by slash-separated path.
///
/// Empty segments are ignored, so `/a/b/`, `a/b` and `//a//b` are the same
/// path, and `/` or the empty string resolve to the root folder. Matching is
/// case-sensitive when `exact_case` is set and case-insensitive otherwise,
/// for legacy lookups. At each level folders are
/// searched before docs and files, and the first match wins.
pub fn find_element_by_path(
    project: &Project,
    path: &str,
    exact_case: bool,
) -> AppResult<LocatedByPath> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let not_found = || AppError::not_found(format!("entity at path {path} not found"));

    let Some((last, ancestors)) = segments.split_last() else {
        return Ok(LocatedByPath {
            element: Entity::Folder(project.root_folder.clone()),
            entity_type: EntityType::Folder,
            parent_id: None,
            path: EntityPath::root(),
        });
    };

    let matches = |candidate: &str, wanted: &str| {
        if exact_case {
            candidate == wanted
        } else {
            candidate.to_lowercase() == wanted.to_lowercase()
        }
    };

    let mut folder = &project.root_folder;
    let mut folder_path = EntityPath::root();
    for segment in ancestors {
        let (index, child) = folder
            .folders
            .iter()
            .enumerate()
            .find(|(_, f)| matches(&f.name, segment))
            .ok_or_else(not_found)?;
        folder_path = folder_path.join(
            &child.name,
            folder_path.locator.child(Collection::Folders, index),
        );
        folder = child;
    }

    let found = if let Some(i) = folder.folders.iter().position(|f| matches(&f.name, last)) {
        Some((Collection::Folders, i, Entity::Folder(folder.folders[i].clone())))
    } else if let Some(i) = folder.docs.iter().position(|d| matches(&d.name, last)) {
        Some((Collection::Docs, i, Entity::Doc(folder.docs[i].clone())))
    } else {
        folder
            .file_refs
            .iter()
            .position(|f| matches(&f.name, last))
            .map(|i| (Collection::FileRefs, i, Entity::File(folder.file_refs[i].clone())))
    };

    let (collection, index, element) = found.ok_or_else(not_found)?;
    Ok(LocatedByPath {
        entity_type: collection.entity_type(),
        parent_id: Some(folder.id),
        path: folder_path.join(element.name(), folder_path.locator.child(collection, index)),
        element,
    })
}

/// Resolve a locator back to the element it designates.
pub fn find_element_by_locator(project: &Project, locator: &Locator) -> AppResult<Entity> {
    let not_found = || AppError::not_found(format!("no element at {locator}"));
    let Some(step) = locator.last() else {
        return Ok(Entity::Folder(project.root_folder.clone()));
    };
    let parent = locator
        .parent()
        .and_then(|p| project.folder_at(&p))
        .ok_or_else(not_found)?;

    let element = match step.collection {
        Collection::Folders => parent.folders.get(step.index).cloned().map(Entity::Folder),
        Collection::Docs => parent.docs.get(step.index).cloned().map(Entity::Doc),
        Collection::FileRefs => parent.file_refs.get(step.index).cloned().map(Entity::File),
    };
    element.ok_or_else(not_found)
}
