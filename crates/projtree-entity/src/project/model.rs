//! Project model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use projtree_core::types::id::{EntityId, ProjectId, UserId};

use crate::doc::DeletedDocRef;
use crate::file::DeletedFileRef;
use crate::folder::Folder;
use crate::path::Locator;

/// Link between a project and its history record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectHistory {
    /// Id of the project in the history service.
    pub id: String,
}

/// A project: metadata plus a single root folder holding the whole tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique project identifier.
    pub id: ProjectId,
    /// Project name, unique per owner.
    pub name: String,
    /// The owning user.
    pub owner_id: UserId,
    /// Root of the file tree.
    pub root_folder: Folder,
    /// Doc compiled as the main file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_doc_id: Option<EntityId>,
    /// History link. Absent when history is disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<ProjectHistory>,
    /// Structure version, bumped once per applied tree update.
    #[serde(default)]
    pub version: u64,
    /// When the project was last changed.
    pub last_updated: DateTime<Utc>,
    /// Who last changed the project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_by: Option<UserId>,
    /// Docs removed from the tree.
    #[serde(default)]
    pub deleted_docs: Vec<DeletedDocRef>,
    /// Files removed or replaced in the tree.
    #[serde(default)]
    pub deleted_files: Vec<DeletedFileRef>,
    /// Whether the project is archived for its owner.
    #[serde(default)]
    pub archived: bool,
}

impl Project {
    /// Create a project with an empty root folder and no history link.
    pub fn new(name: impl Into<String>, owner_id: UserId) -> Self {
        Self {
            id: ProjectId::new(),
            name: name.into(),
            owner_id,
            root_folder: Folder::new("rootFolder"),
            root_doc_id: None,
            history: None,
            version: 0,
            last_updated: Utc::now(),
            last_updated_by: None,
            deleted_docs: Vec::new(),
            deleted_files: Vec::new(),
            archived: false,
        }
    }

    /// Attach a history id.
    pub fn with_history(mut self, history_id: impl Into<String>) -> Self {
        self.history = Some(ProjectHistory {
            id: history_id.into(),
        });
        self
    }

    /// History id, if history is enabled.
    pub fn history_id(&self) -> Option<&str> {
        self.history.as_ref().map(|h| h.id.as_str())
    }

    /// Total number of docs, files, and folders in the tree (root excluded).
    pub fn entity_count(&self) -> usize {
        self.root_folder.count_descendants()
    }

    /// Resolve a folder locator.
    pub fn folder_at(&self, locator: &Locator) -> Option<&Folder> {
        self.root_folder.folder_at(locator)
    }

    /// Mutable counterpart of [`Project::folder_at`].
    pub fn folder_at_mut(&mut self, locator: &Locator) -> Option<&mut Folder> {
        self.root_folder.folder_at_mut(locator)
    }
}
