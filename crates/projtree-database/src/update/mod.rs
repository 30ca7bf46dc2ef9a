//! Targeted tree updates.

pub mod apply;
pub mod model;

pub use apply::apply_update;
pub use model::{Touch, TreeOp, TreeUpdate};
