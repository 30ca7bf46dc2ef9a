//! Bridges between tree events and room subscribers.

pub mod broadcaster;
pub mod memory_pubsub;
