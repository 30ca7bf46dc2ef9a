//! Project tree limits.

use serde::{Deserialize, Serialize};

/// Limits applied to every project tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectLimitsConfig {
    /// Maximum number of docs, files, and folders (root excluded) in a project.
    #[serde(default = "default_max_entities")]
    pub max_entities: usize,
    /// Maximum length, in characters, of a name or a full filesystem path.
    #[serde(default = "default_max_path_length")]
    pub max_path_length: usize,
}

impl Default for ProjectLimitsConfig {
    fn default() -> Self {
        Self {
            max_entities: default_max_entities(),
            max_path_length: default_max_path_length(),
        }
    }
}

fn default_max_entities() -> usize {
    2000
}

fn default_max_path_length() -> usize {
    1024
}
