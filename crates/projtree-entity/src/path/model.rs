//! Derived entity paths.

use serde::{Deserialize, Serialize};

use super::locator::Locator;

/// Where an entity sits, both as a user-facing path and as a storage
/// position. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPath {
    /// Slash-separated path from the root, e.g. `/chapters/intro.tex`.
    /// The root folder is `/`.
    pub file_system: String,
    /// Index path of the entity.
    pub locator: Locator,
}

impl EntityPath {
    /// Path of the root folder.
    pub fn root() -> Self {
        Self {
            file_system: "/".to_string(),
            locator: Locator::root(),
        }
    }

    /// Path of a child named `name` at `locator` below this folder path.
    pub fn join(&self, name: &str, locator: Locator) -> Self {
        let file_system = if self.file_system.ends_with('/') {
            format!("{}{name}", self.file_system)
        } else {
            format!("{}/{name}", self.file_system)
        };
        Self {
            file_system,
            locator,
        }
    }
}
