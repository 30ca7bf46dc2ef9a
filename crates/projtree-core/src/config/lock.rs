//! Project lock configuration.

use serde::{Deserialize, Serialize};

/// Timing for the project-scoped named locks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// How long a caller waits to acquire a lock before giving up.
    #[serde(default = "default_max_wait")]
    pub max_wait_seconds: u64,
    /// How long a holder is expected to keep a lock.
    #[serde(default = "default_timeout")]
    pub default_timeout_seconds: u64,
    /// Hold timeout requested by the resync reconciler.
    #[serde(default = "default_resync_timeout")]
    pub resync_timeout_seconds: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            max_wait_seconds: default_max_wait(),
            default_timeout_seconds: default_timeout(),
            resync_timeout_seconds: default_resync_timeout(),
        }
    }
}

fn default_max_wait() -> u64 {
    10
}

fn default_timeout() -> u64 {
    30
}

fn default_resync_timeout() -> u64 {
    6 * 60
}
