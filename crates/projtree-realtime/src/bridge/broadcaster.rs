//! Room broadcaster: the realtime collaborator backed by [`MemoryPubSub`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use projtree_core::config::RealtimeConfig;
use projtree_core::result::AppResult;
use projtree_core::types::id::ProjectId;
use projtree_service::{RealtimeBroadcast, RoomEvent};

use super::memory_pubsub::MemoryPubSub;
use crate::message::envelope::RoomMessage;

/// Channel name of a project room.
pub fn room_channel(project_id: ProjectId) -> String {
    format!("project:{project_id}")
}

/// Broadcasts tree events to project rooms.
#[derive(Debug, Clone)]
pub struct RoomBroadcaster {
    pubsub: Arc<MemoryPubSub>,
    seq: Arc<AtomicU64>,
}

impl RoomBroadcaster {
    /// Creates a broadcaster with the configured per-room buffer.
    pub fn new(config: &RealtimeConfig) -> Self {
        Self {
            pubsub: Arc::new(MemoryPubSub::new(config.buffer_size)),
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Join the room of `project_id`.
    pub async fn subscribe(&self, project_id: ProjectId) -> broadcast::Receiver<RoomMessage> {
        self.pubsub.subscribe(&room_channel(project_id)).await
    }

    /// Number of clients in the room of `project_id`.
    pub async fn room_size(&self, project_id: ProjectId) -> usize {
        self.pubsub.subscriber_count(&room_channel(project_id)).await
    }
}

#[async_trait]
impl RealtimeBroadcast for RoomBroadcaster {
    async fn emit_to_room(&self, project_id: ProjectId, event: RoomEvent) -> AppResult<()> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        let msg = RoomMessage::new(project_id, event, seq);
        let event_name = msg.event_name();
        let delivered = self.pubsub.publish(&room_channel(project_id), msg).await;
        debug!(
            project_id = %project_id,
            event = event_name,
            delivered,
            "Emitted room event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projtree_core::types::id::EntityId;
    use projtree_entity::Folder;

    #[tokio::test]
    async fn test_subscribers_receive_room_events() {
        let broadcaster = RoomBroadcaster::new(&RealtimeConfig::default());
        let project_id = ProjectId::new();
        let mut first = broadcaster.subscribe(project_id).await;
        let mut second = broadcaster.subscribe(project_id).await;
        assert_eq!(broadcaster.room_size(project_id).await, 2);

        let folder = Folder::new("chapters");
        broadcaster
            .emit_to_room(
                project_id,
                RoomEvent::ReceiveNewFolder {
                    folder_id: EntityId::new(),
                    folder: folder.clone(),
                },
            )
            .await
            .unwrap();

        for rx in [&mut first, &mut second] {
            let msg = rx.recv().await.unwrap();
            assert_eq!(msg.project_id, project_id);
            assert_eq!(msg.event_name(), "reciveNewFolder");
            assert_eq!(msg.seq, 1);
        }
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let broadcaster = RoomBroadcaster::new(&RealtimeConfig::default());
        let mine = ProjectId::new();
        let other = ProjectId::new();
        let mut rx = broadcaster.subscribe(mine).await;

        broadcaster
            .emit_to_room(
                other,
                RoomEvent::ReceiveEntityRename {
                    id: EntityId::new(),
                    name: "x.tex".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_succeeds() {
        let broadcaster = RoomBroadcaster::new(&RealtimeConfig::default());
        let project_id = ProjectId::new();
        drop(broadcaster.subscribe(project_id).await);

        broadcaster
            .emit_to_room(
                project_id,
                RoomEvent::RemoveEntity {
                    id: EntityId::new(),
                    source: "editor".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(broadcaster.pubsub.channel_count().await, 0);
    }
}
