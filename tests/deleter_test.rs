//! Integration tests for project soft-deletion.

mod helpers;

use projtree_core::ErrorKind;
use projtree_core::config::AppConfig;
use projtree_database::ProjectStore;

#[tokio::test]
async fn test_delete_and_restore_project() {
    let app = helpers::TestApp::new().await;
    app.doc(None, "main.tex").await;

    let record = app
        .deleter
        .delete_project(app.project_id, &app.ctx)
        .await
        .unwrap();
    assert_eq!(record.deleter_data.deleted_project_id, app.project_id);
    assert_eq!(
        record.deleter_data.deleted_project_history_id.as_deref(),
        Some(helpers::HISTORY_ID)
    );
    assert_eq!(record.deleter_data.deleter_id, Some(app.owner_id));
    assert!(app.stores.projects.find(app.project_id).await.unwrap().is_none());
    assert!(app.content.is_archived(app.project_id));

    let restored = app.deleter.undelete_project(app.project_id).await.unwrap();
    assert_eq!(restored.name, "thesis (Restored)");
    assert_eq!(restored.root_folder.docs[0].name, "main.tex");
    assert_eq!(app.project().await.name, "thesis (Restored)");

    let err = app
        .deleter
        .undelete_project(app.project_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_archive_failure_does_not_block_delete() {
    let app = helpers::TestApp::new().await;
    app.doc(None, "main.tex").await;
    app.content.fail_archives();

    app.deleter
        .delete_project(app.project_id, &app.ctx)
        .await
        .unwrap();
    assert!(app.stores.projects.find(app.project_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expiry_only_purges_old_records() {
    let mut config = AppConfig::default();
    config.deleter.expiry_days = 0;
    let app = helpers::TestApp::with_config(config).await;
    app.doc(None, "main.tex").await;
    app.deleter
        .delete_project(app.project_id, &app.ctx)
        .await
        .unwrap();

    let expired = app
        .deleter
        .expire_deleted_projects_after_duration()
        .await
        .unwrap();
    assert_eq!(expired, 1);

    let err = app
        .deleter
        .undelete_project(app.project_id)
        .await
        .unwrap_err();
    assert_eq!(err.message, "project_too_old_to_restore");
}

#[tokio::test]
async fn test_recent_records_survive_expiry() {
    let app = helpers::TestApp::new().await;
    app.deleter
        .delete_project(app.project_id, &app.ctx)
        .await
        .unwrap();

    let expired = app
        .deleter
        .expire_deleted_projects_after_duration()
        .await
        .unwrap();
    assert_eq!(expired, 0);
    app.deleter.undelete_project(app.project_id).await.unwrap();
}
