//! Lock key builders.

use std::fmt::Display;

/// Prefix applied to all lock keys.
const PREFIX: &str = "projtree";

/// Namespace serializing raw tree updates of one project.
pub const TREE_UPDATE: &str = "tree_update";

/// Namespace serializing handler-level structure operations of one project.
pub const STRUCTURE_UPDATE: &str = "structure_update";

/// Lock key for `namespace` and `id`.
pub fn lock_key(namespace: &str, id: impl Display) -> String {
    format!("{PREFIX}:lock:{namespace}:{id}")
}
