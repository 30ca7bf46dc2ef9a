//! The tree update language.
//!
//! An update never replaces a project wholesale. It names positions with
//! [`Locator`]s and pairs each with the id expected there, so a store can
//! refuse the update when a concurrent change has moved things around.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use projtree_core::types::id::{EntityId, UserId};
use projtree_entity::{DeletedDocRef, DeletedFileRef, Entity, FileRef, Folder, Locator};

/// One targeted operation on a project document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TreeOp {
    /// Append `entity` to the matching collection of the folder at `folder`.
    PushEntity {
        folder: Locator,
        folder_id: EntityId,
        entity: Entity,
    },
    /// Remove the element at `locator`, with its subtree.
    PullEntity { locator: Locator, entity_id: EntityId },
    /// Set the name of the element at `locator`.
    RenameEntity {
        locator: Locator,
        entity_id: EntityId,
        name: String,
    },
    /// Swap the file at `locator` for a new revision: id, hash, provenance
    /// and creation time come from `file`, the name is kept and `rev` is
    /// incremented.
    ReplaceFile {
        locator: Locator,
        entity_id: EntityId,
        file: FileRef,
    },
    /// Install a whole folder structure. Only valid on an empty tree.
    ReplaceRootFolder { folder: Folder },
    /// Record a deleted doc.
    PushDeletedDoc { doc: DeletedDocRef },
    /// Record a deleted or replaced file.
    PushDeletedFile { file: DeletedFileRef },
    /// Set or clear the root doc.
    SetRootDoc { doc_id: Option<EntityId> },
}

/// Who changed the project and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Touch {
    /// Time of the change.
    pub at: DateTime<Utc>,
    /// Acting user, if known.
    pub by: Option<UserId>,
}

/// A batch of operations applied atomically to one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeUpdate {
    /// Operations, applied in order.
    pub ops: Vec<TreeOp>,
    /// Whether the project version is incremented.
    pub increment_version: bool,
    /// Last-updated stamp to record, if any.
    pub touched: Option<Touch>,
}

impl TreeUpdate {
    /// An update that changes the tree structure and bumps the version once.
    pub fn structural(ops: Vec<TreeOp>) -> Self {
        Self {
            ops,
            increment_version: true,
            touched: None,
        }
    }

    /// An update to project metadata that leaves the version alone.
    pub fn metadata(ops: Vec<TreeOp>) -> Self {
        Self {
            ops,
            increment_version: false,
            touched: None,
        }
    }

    /// Stamp the update with the current time and the acting user.
    pub fn touched_by(mut self, user_id: Option<UserId>) -> Self {
        self.touched = Some(Touch {
            at: Utc::now(),
            by: user_id,
        });
        self
    }
}
