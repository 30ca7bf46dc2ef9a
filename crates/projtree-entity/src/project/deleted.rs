//! Soft-deleted project records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use projtree_core::types::id::{DeletedProjectId, ProjectId, UserId};

use super::model::Project;

/// Who deleted a project, when, and what it looked like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleterData {
    /// When the project was deleted.
    pub deleted_at: DateTime<Utc>,
    /// Id of the deleted project.
    pub deleted_project_id: ProjectId,
    /// Owner of the deleted project.
    pub deleted_project_owner_id: UserId,
    /// History id of the deleted project, if history was enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_project_history_id: Option<String>,
    /// Last update time of the project when it was deleted.
    pub deleted_project_last_updated_at: DateTime<Utc>,
    /// User who performed the deletion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleter_id: Option<UserId>,
    /// IP address the deletion came from. Cleared on expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleter_ip_address: Option<String>,
}

/// A retained snapshot of a deleted project.
///
/// `project` is `None` once the record has expired and the snapshot has
/// been purged; the deleter data is kept for bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedProject {
    /// Record identifier.
    pub id: DeletedProjectId,
    /// The snapshot, absent after expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
    /// Deletion metadata.
    pub deleter_data: DeleterData,
}

impl DeletedProject {
    /// Whether the snapshot has been purged.
    pub fn is_expired(&self) -> bool {
        self.project.is_none()
    }
}
