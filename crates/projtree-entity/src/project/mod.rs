//! Project aggregate and soft-deletion records.

pub mod deleted;
pub mod model;

pub use deleted::{DeletedProject, DeleterData};
pub use model::{Project, ProjectHistory};
