//! Soft-deletion retention configuration.

use serde::{Deserialize, Serialize};

/// How long deleted projects stay recoverable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleterConfig {
    /// Days a deleted project snapshot is retained before it is purged.
    #[serde(default = "default_expiry_days")]
    pub expiry_days: i64,
}

impl Default for DeleterConfig {
    fn default() -> Self {
        Self {
            expiry_days: default_expiry_days(),
        }
    }
}

fn default_expiry_days() -> i64 {
    90
}
