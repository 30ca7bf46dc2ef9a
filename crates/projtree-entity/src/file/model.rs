//! File reference model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use projtree_core::types::id::EntityId;

/// A binary file in the tree. The bytes live in the blob store; the tree
/// only carries metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    /// Unique file identifier.
    pub id: EntityId,
    /// File name (a single path segment).
    pub name: String,
    /// Revision counter, bumped when the file is replaced in place.
    #[serde(default)]
    pub rev: u64,
    /// Content hash of the stored blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// When this revision of the file was created.
    pub created: DateTime<Utc>,
    /// Provenance for files imported from another project or a URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_file_data: Option<serde_json::Value>,
}

impl FileRef {
    /// Create a file reference with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            rev: 0,
            hash: None,
            created: Utc::now(),
            linked_file_data: None,
        }
    }

    /// Set the content hash.
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }
}

/// Record of a file that used to be in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedFileRef {
    /// Id of the deleted file.
    pub id: EntityId,
    /// Name at the time of deletion.
    pub name: String,
    /// Content hash at the time of deletion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Provenance carried over from the live file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_file_data: Option<serde_json::Value>,
    /// When the file was removed.
    pub deleted_at: DateTime<Utc>,
}

impl DeletedFileRef {
    /// Build a deleted reference from a live file.
    pub fn from_file(file: &FileRef, deleted_at: DateTime<Utc>) -> Self {
        Self {
            id: file.id,
            name: file.name.clone(),
            hash: file.hash.clone(),
            linked_file_data: file.linked_file_data.clone(),
            deleted_at,
        }
    }
}
