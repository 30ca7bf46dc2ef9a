//! Messages delivered to room subscribers.

pub mod envelope;
pub mod serializer;
