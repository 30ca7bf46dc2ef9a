//! # projtree-service
//!
//! The tree engine. Path resolution, name validation, targeted mutations,
//! whole-tree resync, and the orchestration that turns each structural
//! change into calls on the companion services.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod collaborators;
pub mod context;
pub mod deleter;
pub mod entities;
pub mod handler;
pub mod locator;
pub mod mutator;
pub mod notifier;
pub mod resync;
pub mod safe_path;

pub use collaborators::{
    BlobStore, ContentStore, HistoryService, RealtimeBroadcast, StructureSync,
};
pub use context::RequestContext;
pub use deleter::ProjectDeleter;
pub use handler::{Collaborators, EntityUpdateHandler};
pub use mutator::TreeMutator;
pub use notifier::RoomEvent;
pub use resync::{ResyncReconciler, ResyncReport};
pub use safe_path::NameValidator;
