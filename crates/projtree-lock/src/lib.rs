//! # projtree-lock
//!
//! Named, project-scoped mutual exclusion. Every lock is identified by a
//! namespace and a project id, so operations on different projects never
//! contend while operations on the same project are serialized.

pub mod keys;
pub mod manager;

pub use manager::{LockGuard, LockManager};
