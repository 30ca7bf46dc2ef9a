//! Binary file references.

pub mod model;

pub use model::{DeletedFileRef, FileRef};
