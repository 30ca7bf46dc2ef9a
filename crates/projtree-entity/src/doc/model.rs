//! Doc entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use projtree_core::types::id::EntityId;

/// An editable text document in the tree. Its lines live in the content
/// store, keyed by the doc id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doc {
    /// Unique doc identifier.
    pub id: EntityId,
    /// Doc name (a single path segment).
    pub name: String,
    /// Content revision as last reported by the content store.
    #[serde(default)]
    pub rev: u64,
}

impl Doc {
    /// Create a doc with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(EntityId::new(), name)
    }

    /// Create a doc with a known id.
    pub fn with_id(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rev: 0,
        }
    }
}

/// Record of a doc that used to be in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedDocRef {
    /// Id of the deleted doc.
    pub id: EntityId,
    /// Name at the time of deletion.
    pub name: String,
    /// When the doc was removed.
    pub deleted_at: DateTime<Utc>,
}
