//! In-memory pub/sub for single-node deployments.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tokio::sync::broadcast;

use crate::message::envelope::RoomMessage;

/// In-memory pub/sub implementation, one broadcast channel per room.
#[derive(Debug)]
pub struct MemoryPubSub {
    /// Channel name → broadcast sender
    channels: RwLock<HashMap<String, broadcast::Sender<RoomMessage>>>,
    /// Buffer size for channels
    buffer_size: usize,
}

impl MemoryPubSub {
    /// Create a new in-memory pub/sub
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Publish a message to a channel. Returns how many subscribers got it.
    ///
    /// A channel whose subscribers have all gone away is dropped.
    pub async fn publish(&self, channel: &str, msg: RoomMessage) -> usize {
        let delivered = {
            let channels = self.channels.read().await;
            match channels.get(channel) {
                Some(tx) => tx.send(msg).ok(),
                None => return 0,
            }
        };

        match delivered {
            Some(count) => count,
            None => {
                let mut channels = self.channels.write().await;
                if channels
                    .get(channel)
                    .is_some_and(|tx| tx.receiver_count() == 0)
                {
                    channels.remove(channel);
                }
                0
            }
        }
    }

    /// Subscribe to a channel, returns a receiver
    pub async fn subscribe(&self, channel: &str) -> broadcast::Receiver<RoomMessage> {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer_size).0);
        tx.subscribe()
    }

    /// Number of live subscribers on a channel
    pub async fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .read()
            .await
            .get(channel)
            .map_or(0, |tx| tx.receiver_count())
    }

    /// Number of open channels
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}
