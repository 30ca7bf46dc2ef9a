//! Message envelope for room events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use projtree_core::types::id::ProjectId;
use projtree_service::RoomEvent;

/// Envelope wrapping a room event with delivery metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessage {
    /// Unique message ID for deduplication
    pub id: String,
    /// Room the event was sent to
    pub project_id: ProjectId,
    /// Sequence number within the room
    pub seq: u64,
    /// The event payload
    pub data: RoomEvent,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl RoomMessage {
    /// Wrap `data` for delivery to the room of `project_id`.
    pub fn new(project_id: ProjectId, data: RoomEvent, seq: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            seq,
            data,
            timestamp: Utc::now(),
        }
    }

    /// Wire name of the wrapped event.
    pub fn event_name(&self) -> &'static str {
        self.data.name()
    }
}
