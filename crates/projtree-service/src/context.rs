//! Request context carrying the acting user and the origin of a change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use projtree_core::types::id::UserId;

/// Context for the current operation.
///
/// Passed into service methods so every mutation knows *who* is acting and
/// *where* the change came from. The source is forwarded verbatim to
/// realtime and history notifications (`editor`, `upload`, `resync`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Acting user, absent for system operations.
    pub user_id: Option<UserId>,
    /// Origin of the change.
    pub source: String,
    /// IP address of the request origin.
    pub ip_address: Option<String>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Context for a user-initiated change from the editor.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            source: "editor".to_string(),
            ip_address: None,
            request_time: Utc::now(),
        }
    }

    /// Context for a change made by the system itself.
    pub fn system(source: impl Into<String>) -> Self {
        Self {
            user_id: None,
            source: source.into(),
            ip_address: None,
            request_time: Utc::now(),
        }
    }

    /// Override the change source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Attach the request IP address.
    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }
}
