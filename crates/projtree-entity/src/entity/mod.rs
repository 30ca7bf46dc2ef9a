//! Polymorphic tree elements.

pub mod kind;
pub mod model;

pub use kind::EntityType;
pub use model::{Entity, TreeEntity};
