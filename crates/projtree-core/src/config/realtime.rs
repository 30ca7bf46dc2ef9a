//! In-process room broadcast configuration.

use serde::{Deserialize, Serialize};

/// Room broadcast settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Internal channel buffer size for each project room.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
        }
    }
}

fn default_buffer_size() -> usize {
    256
}
