//! Shared primitive types.

pub mod id;

pub use id::{DeletedProjectId, EntityId, ProjectId, UserId};
