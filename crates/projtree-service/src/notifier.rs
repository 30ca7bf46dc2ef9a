//! Payloads describing tree changes to the companion services.
//!
//! Nothing here performs I/O. The handler builds these values and hands
//! them to the collaborator traits in [`crate::collaborators`].

use serde::{Deserialize, Serialize};

use projtree_core::types::id::{EntityId, ProjectId};
use projtree_entity::{Doc, Entity, EntityType, FileRef, Folder, Project, TreeEntity};

/// Event broadcast to every client connected to a project room.
///
/// Event names match the wire protocol of the editor clients, including its
/// historical spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RoomEvent {
    /// A doc was added to `folder_id`.
    #[serde(rename = "reciveNewDoc", rename_all = "camelCase")]
    ReceiveNewDoc {
        folder_id: EntityId,
        doc: Doc,
        source: String,
    },
    /// A file was added to `folder_id`.
    #[serde(rename = "reciveNewFile", rename_all = "camelCase")]
    ReceiveNewFile {
        folder_id: EntityId,
        file: FileRef,
        source: String,
        linked_file_data: Option<serde_json::Value>,
    },
    /// A folder was added to `folder_id`.
    #[serde(rename = "reciveNewFolder", rename_all = "camelCase")]
    ReceiveNewFolder { folder_id: EntityId, folder: Folder },
    /// An entity was renamed.
    #[serde(rename = "reciveEntityRename", rename_all = "camelCase")]
    ReceiveEntityRename { id: EntityId, name: String },
    /// An entity was moved into `folder_id`.
    #[serde(rename = "reciveEntityMove", rename_all = "camelCase")]
    ReceiveEntityMove { id: EntityId, folder_id: EntityId },
    /// An entity was removed.
    #[serde(rename = "removeEntity", rename_all = "camelCase")]
    RemoveEntity { id: EntityId, source: String },
}

impl RoomEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReceiveNewDoc { .. } => "reciveNewDoc",
            Self::ReceiveNewFile { .. } => "reciveNewFile",
            Self::ReceiveNewFolder { .. } => "reciveNewFolder",
            Self::ReceiveEntityRename { .. } => "reciveEntityRename",
            Self::ReceiveEntityMove { .. } => "reciveEntityMove",
            Self::RemoveEntity { .. } => "removeEntity",
        }
    }
}

/// A doc and its path in a structure change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocChange {
    /// The doc.
    pub doc: Doc,
    /// Path with a leading slash.
    pub path: String,
    /// Initial content, only for newly added docs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_lines: Option<String>,
}

/// A file and its path in a structure change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    /// The file reference.
    pub file: FileRef,
    /// Path with a leading slash.
    pub path: String,
    /// Whether the blob store created a new blob for this file.
    #[serde(default)]
    pub created_blob: bool,
}

/// Version of the project after a structure change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectVersion {
    /// Structure version.
    pub version: u64,
}

impl From<&Project> for ProjectVersion {
    fn from(project: &Project) -> Self {
        Self {
            version: project.version,
        }
    }
}

/// Structure change sent to the history service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStructureChanges {
    /// Docs at their old paths.
    #[serde(default)]
    pub old_docs: Vec<DocChange>,
    /// Docs at their new paths.
    #[serde(default)]
    pub new_docs: Vec<DocChange>,
    /// Files at their old paths.
    #[serde(default)]
    pub old_files: Vec<FileChange>,
    /// Files at their new paths.
    #[serde(default)]
    pub new_files: Vec<FileChange>,
    /// Project version after the change.
    pub new_project: ProjectVersion,
}

impl ProjectStructureChanges {
    /// An empty change set against `project`.
    pub fn empty(project: &Project) -> Self {
        Self {
            old_docs: Vec::new(),
            new_docs: Vec::new(),
            old_files: Vec::new(),
            new_files: Vec::new(),
            new_project: project.into(),
        }
    }

    /// A doc was added.
    pub fn for_added_doc(doc: &Doc, path: &str, lines: &[String], project: &Project) -> Self {
        Self {
            new_docs: vec![DocChange {
                doc: doc.clone(),
                path: path.to_string(),
                doc_lines: Some(lines.join("\n")),
            }],
            ..Self::empty(project)
        }
    }

    /// A file was added.
    pub fn for_added_file(
        file: &FileRef,
        path: &str,
        created_blob: bool,
        project: &Project,
    ) -> Self {
        Self {
            new_files: vec![FileChange {
                file: file.clone(),
                path: path.to_string(),
                created_blob,
            }],
            ..Self::empty(project)
        }
    }

    /// Everything in `removed` disappeared.
    pub fn for_deleted(removed: &[SubtreeEntry], project: &Project) -> Self {
        let (old_docs, old_files) = split_entries(removed);
        Self {
            old_docs,
            old_files,
            ..Self::empty(project)
        }
    }

    /// Everything in `before` now lives at the paths in `after`.
    pub fn for_move(before: &[SubtreeEntry], after: &[SubtreeEntry], project: &Project) -> Self {
        let (old_docs, old_files) = split_entries(before);
        let (new_docs, new_files) = split_entries(after);
        Self {
            old_docs,
            new_docs,
            old_files,
            new_files,
            new_project: project.into(),
        }
    }
}

fn split_entries(entries: &[SubtreeEntry]) -> (Vec<DocChange>, Vec<FileChange>) {
    let mut docs = Vec::new();
    let mut files = Vec::new();
    for entry in entries {
        match &entry.entity {
            Entity::Doc(doc) => docs.push(DocChange {
                doc: doc.clone(),
                path: entry.path.clone(),
                doc_lines: None,
            }),
            Entity::File(file) => files.push(FileChange {
                file: file.clone(),
                path: entry.path.clone(),
                created_blob: false,
            }),
            Entity::Folder(_) => {}
        }
    }
    (docs, files)
}

/// One element of a flattened subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtreeEntry {
    /// Kind of the element.
    pub entity_type: EntityType,
    /// The element. Folder entries carry their own subtree too.
    pub entity: Entity,
    /// Path with a leading slash.
    pub path: String,
}

/// Flatten `entity` at `path` into itself plus every descendant.
///
/// Folders are listed before their contents; within a folder docs come
/// first, then files, then subfolders.
pub fn subtree_listing(entity: &Entity, path: &str) -> Vec<SubtreeEntry> {
    let mut out = vec![SubtreeEntry {
        entity_type: entity.entity_type(),
        entity: entity.clone(),
        path: path.to_string(),
    }];
    if let Entity::Folder(folder) = entity {
        collect_folder(folder, path, &mut out);
    }
    out
}

fn collect_folder(folder: &Folder, path: &str, out: &mut Vec<SubtreeEntry>) {
    for doc in &folder.docs {
        out.push(SubtreeEntry {
            entity_type: EntityType::Doc,
            entity: Entity::Doc(doc.clone()),
            path: join_path(path, &doc.name),
        });
    }
    for file in &folder.file_refs {
        out.push(SubtreeEntry {
            entity_type: EntityType::File,
            entity: Entity::File(file.clone()),
            path: join_path(path, &file.name),
        });
    }
    for child in &folder.folders {
        let child_path = join_path(path, &child.name);
        out.push(SubtreeEntry {
            entity_type: EntityType::Folder,
            entity: Entity::Folder(child.clone()),
            path: child_path.clone(),
        });
        collect_folder(child, &child_path, out);
    }
}

/// Join a slash-prefixed folder path and a name.
pub(crate) fn join_path(folder_path: &str, name: &str) -> String {
    if folder_path.ends_with('/') {
        format!("{folder_path}{name}")
    } else {
        format!("{folder_path}/{name}")
    }
}

/// A doc to push to the third-party store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TpdsAddDoc {
    pub project_id: ProjectId,
    pub doc_id: EntityId,
    pub path: String,
    pub project_name: String,
    pub rev: u64,
}

/// A file to push to the third-party store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TpdsAddFile {
    pub project_id: ProjectId,
    pub file_id: EntityId,
    pub path: String,
    pub project_name: String,
    pub rev: u64,
    pub hash: Option<String>,
}

/// A move or rename to mirror in the third-party store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TpdsMoveEntity {
    pub project_id: ProjectId,
    pub start_path: String,
    pub end_path: String,
    pub project_name: String,
    pub rev: u64,
}

/// A deletion to mirror in the third-party store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TpdsDeleteEntity {
    pub project_id: ProjectId,
    pub path: String,
    pub project_name: String,
    pub entity_id: EntityId,
    pub entity_type: EntityType,
    /// Ids of the entity and everything below it.
    pub subtree_entity_ids: Vec<EntityId>,
}

impl TpdsDeleteEntity {
    /// Describe the deletion of `entity` at `path` in `project`.
    pub fn new(project: &Project, entity: &Entity, path: &str) -> Self {
        Self {
            project_id: project.id,
            path: path.to_string(),
            project_name: project.name.clone(),
            entity_id: entity.id(),
            entity_type: entity.entity_type(),
            subtree_entity_ids: subtree_listing(entity, path)
                .iter()
                .map(|entry| entry.entity.id())
                .collect(),
        }
    }
}
