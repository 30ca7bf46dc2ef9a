//! The set of services a CLI invocation runs against.
//!
//! A workspace either loads a project snapshot (a JSON file holding one
//! project) into the in-memory store, or connects to the configured store
//! and works on a project by id.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use projtree_core::config::AppConfig;
use projtree_core::error::AppError;
use projtree_core::result::AppResult;
use projtree_core::types::id::ProjectId;
use projtree_database::{ProjectStore, StoreManager};
use projtree_entity::Project;
use projtree_lock::LockManager;
use projtree_realtime::RoomBroadcaster;
use projtree_service::collaborators::memory::{
    MemoryBlobStore, MemoryContentStore, RecordingHistory, RecordingStructureSync,
};
use projtree_service::{Collaborators, EntityUpdateHandler, ProjectDeleter};

/// Services wired for one CLI invocation.
#[derive(Debug)]
pub struct Workspace {
    /// Loaded configuration.
    pub config: AppConfig,
    /// Project stores.
    pub stores: StoreManager,
    /// Entity update handler.
    pub handler: EntityUpdateHandler,
    /// Project deleter.
    pub deleter: ProjectDeleter,
    /// Room broadcaster.
    pub realtime: RoomBroadcaster,
    project_id: Option<ProjectId>,
    snapshot: Option<PathBuf>,
}

impl Workspace {
    /// Open a workspace on a snapshot file, or on the configured store.
    pub async fn open(
        config: AppConfig,
        snapshot: Option<&Path>,
        project_id: Option<ProjectId>,
    ) -> AppResult<Self> {
        let (stores, project_id) = match snapshot {
            Some(path) => {
                let project = read_snapshot(path).await?;
                let stores = StoreManager::in_memory();
                stores.projects.insert(&project).await?;
                info!(project_id = %project.id, path = %path.display(), "Loaded snapshot");
                (stores, Some(project.id))
            }
            None => (StoreManager::new(&config.database).await?, project_id),
        };

        let content = Arc::new(MemoryContentStore::new());
        let history = Arc::new(RecordingHistory::new());
        let realtime = RoomBroadcaster::new(&config.realtime);
        let services = Collaborators {
            content: content.clone(),
            blobs: Arc::new(MemoryBlobStore::new()),
            history: history.clone(),
            realtime: Arc::new(realtime.clone()),
            tpds: Arc::new(RecordingStructureSync::new()),
        };

        let locks = LockManager::new(&config.lock);
        let handler = EntityUpdateHandler::new(
            Arc::clone(&stores.projects),
            locks.clone(),
            &config,
            services,
        );
        let deleter = ProjectDeleter::new(
            Arc::clone(&stores.projects),
            Arc::clone(&stores.deleted_projects),
            content,
            history,
            locks,
            config.deleter.clone(),
        );

        Ok(Self {
            config,
            stores,
            handler,
            deleter,
            realtime,
            project_id,
            snapshot: snapshot.map(Path::to_path_buf),
        })
    }

    /// The project this invocation works on.
    pub fn project_id(&self) -> AppResult<ProjectId> {
        self.project_id
            .ok_or_else(|| AppError::validation("no project selected: pass --snapshot or --project"))
    }

    /// Current state of the selected project.
    pub async fn project(&self) -> AppResult<Project> {
        self.stores.projects.get(self.project_id()?).await
    }

    /// Write the selected project back to the snapshot file, if any.
    pub async fn save(&self) -> AppResult<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        let project = self.project().await?;
        write_snapshot(path, &project).await
    }
}

/// Read a project snapshot.
pub async fn read_snapshot(path: &Path) -> AppResult<Project> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::with_source(
            projtree_core::ErrorKind::Storage,
            format!("Failed to read snapshot {}", path.display()),
            e,
        )
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Write a project snapshot.
pub async fn write_snapshot(path: &Path, project: &Project) -> AppResult<()> {
    let text = serde_json::to_string_pretty(project)?;
    tokio::fs::write(path, text).await?;
    Ok(())
}
