//! # projtree-realtime
//!
//! In-process delivery of tree change events to everyone connected to a
//! project room. Each project gets its own `tokio::sync::broadcast`
//! channel; [`RoomBroadcaster`] implements the service layer's
//! `RealtimeBroadcast` interface on top of it.

pub mod bridge;
pub mod message;

pub use bridge::broadcaster::RoomBroadcaster;
pub use bridge::memory_pubsub::MemoryPubSub;
pub use message::envelope::RoomMessage;
