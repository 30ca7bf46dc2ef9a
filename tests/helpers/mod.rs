//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use projtree_core::config::AppConfig;
use projtree_core::types::id::{EntityId, ProjectId, UserId};
use projtree_database::{ProjectStore, StoreManager};
use projtree_entity::Project;
use projtree_lock::LockManager;
use projtree_service::collaborators::memory::{
    MemoryBlobStore, MemoryContentStore, RecordingBroadcast, RecordingHistory,
    RecordingStructureSync,
};
use projtree_service::{Collaborators, EntityUpdateHandler, ProjectDeleter, RequestContext};

/// History id given to every test project.
pub const HISTORY_ID: &str = "history-1";

/// Test application context
pub struct TestApp {
    /// Project stores
    pub stores: StoreManager,
    /// Entity update handler under test
    pub handler: EntityUpdateHandler,
    /// Project deleter under test
    pub deleter: ProjectDeleter,
    /// Doc content store
    pub content: Arc<MemoryContentStore>,
    /// Blob store
    pub blobs: Arc<MemoryBlobStore>,
    /// History calls
    pub history: Arc<RecordingHistory>,
    /// Third-party store calls
    pub tpds: Arc<RecordingStructureSync>,
    /// Room events
    pub realtime: Arc<RecordingBroadcast>,
    /// The seeded project
    pub project_id: ProjectId,
    /// Owner of the seeded project
    pub owner_id: UserId,
    /// Context for every change
    pub ctx: RequestContext,
}

impl TestApp {
    /// Create a test application with default configuration
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    /// Create a test application with an explicit configuration
    pub async fn with_config(config: AppConfig) -> Self {
        let stores = StoreManager::in_memory();
        let owner_id = UserId::new();
        let project = Project::new("thesis", owner_id).with_history(HISTORY_ID);
        let project_id = project.id;
        stores
            .projects
            .insert(&project)
            .await
            .expect("Failed to seed project");

        let content = Arc::new(MemoryContentStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let history = Arc::new(RecordingHistory::new());
        let tpds = Arc::new(RecordingStructureSync::new());
        let realtime = Arc::new(RecordingBroadcast::new());

        let locks = LockManager::new(&config.lock);
        let handler = EntityUpdateHandler::new(
            Arc::clone(&stores.projects),
            locks.clone(),
            &config,
            Collaborators {
                content: content.clone(),
                blobs: blobs.clone(),
                history: history.clone(),
                realtime: realtime.clone(),
                tpds: tpds.clone(),
            },
        );
        let deleter = ProjectDeleter::new(
            Arc::clone(&stores.projects),
            Arc::clone(&stores.deleted_projects),
            content.clone(),
            history.clone(),
            locks,
            config.deleter.clone(),
        );

        let ctx = RequestContext::new(owner_id).with_source("editor");
        Self {
            stores,
            handler,
            deleter,
            content,
            blobs,
            history,
            tpds,
            realtime,
            project_id,
            owner_id,
            ctx,
        }
    }

    /// Current state of the seeded project
    pub async fn project(&self) -> Project {
        self.stores
            .projects
            .get(self.project_id)
            .await
            .expect("Project should exist")
    }

    /// Id of the seeded project's root folder
    pub async fn root_id(&self) -> EntityId {
        self.project().await.root_folder.id
    }

    /// Create a folder under `parent` (root when `None`) and return its id
    pub async fn folder(&self, parent: Option<EntityId>, name: &str) -> EntityId {
        self.handler
            .add_folder(self.project_id, parent, name, &self.ctx)
            .await
            .expect("Failed to add folder")
            .folder
            .id
    }

    /// Create a doc under `parent` (root when `None`) and return its id
    pub async fn doc(&self, parent: Option<EntityId>, name: &str) -> EntityId {
        self.handler
            .add_doc(
                self.project_id,
                parent,
                name,
                vec!["\\section{Intro}".to_string()],
                &self.ctx,
            )
            .await
            .expect("Failed to add doc")
            .doc
            .id
    }
}
