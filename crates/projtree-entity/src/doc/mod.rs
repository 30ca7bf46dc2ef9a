//! Doc entities.

pub mod model;

pub use model::{DeletedDocRef, Doc};
