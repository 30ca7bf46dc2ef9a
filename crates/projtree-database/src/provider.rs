//! Store manager that dispatches to the configured backend.

use std::sync::Arc;

use tracing::info;

use projtree_core::config::DatabaseConfig;
use projtree_core::error::AppError;
use projtree_core::result::AppResult;

use crate::store::{DeletedProjectStore, ProjectStore};

/// Pair of stores selected from configuration.
#[derive(Debug, Clone)]
pub struct StoreManager {
    /// Live projects.
    pub projects: Arc<dyn ProjectStore>,
    /// Soft-deleted projects.
    pub deleted_projects: Arc<dyn DeletedProjectStore>,
}

impl StoreManager {
    /// Create the stores named by `config.provider`.
    ///
    /// The postgres backend connects and migrates the schema first.
    pub async fn new(config: &DatabaseConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory project store");
                Ok(Self::in_memory())
            }
            #[cfg(feature = "postgres")]
            "postgres" => {
                info!("Initializing PostgreSQL project store");
                let db = crate::connection::DatabasePool::connect(config).await?;
                let pool = db.pool().clone();
                Ok(Self {
                    projects: Arc::new(crate::stores::postgres::PgProjectStore::new(pool.clone())),
                    deleted_projects: Arc::new(
                        crate::stores::postgres::PgDeletedProjectStore::new(pool),
                    ),
                })
            }
            other => Err(AppError::configuration(format!(
                "Unknown database provider: '{other}'. Supported: memory, postgres"
            ))),
        }
    }

    /// Fresh in-memory stores.
    #[cfg(feature = "memory")]
    pub fn in_memory() -> Self {
        Self {
            projects: Arc::new(crate::stores::memory::MemoryProjectStore::new()),
            deleted_projects: Arc::new(crate::stores::memory::MemoryDeletedProjectStore::new()),
        }
    }
}
