//! Integration tests for tree mutations through the entity update handler.

mod helpers;

use projtree_core::ErrorKind;
use projtree_entity::EntityType;
use projtree_service::collaborators::memory::SyncCall;
use projtree_service::entities::list_all;

#[tokio::test]
async fn test_add_doc_into_nested_folder() {
    let app = helpers::TestApp::new().await;
    let chapters = app.folder(None, "chapters").await;
    let appendix = app.folder(Some(chapters), "appendix").await;

    let added = app
        .handler
        .add_doc(
            app.project_id,
            Some(appendix),
            "proofs.tex",
            vec!["\\section{Proofs}".to_string()],
            &app.ctx,
        )
        .await
        .unwrap();

    assert_eq!(added.path, "/chapters/appendix/proofs.tex");
    assert_eq!(added.folder_id, appendix);
    let listing = list_all(&app.project().await);
    let docs: Vec<&str> = listing.docs.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(docs, vec!["chapters/appendix/proofs.tex"]);

    let update = app.history.structure_updates().pop().unwrap();
    assert_eq!(update.new_docs[0].path, "/chapters/appendix/proofs.tex");
    assert_eq!(
        update.new_docs[0].doc_lines.as_deref(),
        Some("\\section{Proofs}")
    );
    assert!(matches!(app.tpds.calls().last(), Some(SyncCall::AddDoc(_))));
    assert_eq!(app.realtime.event_names().last(), Some(&"reciveNewDoc"));
}

#[tokio::test]
async fn test_each_structural_change_bumps_version() {
    let app = helpers::TestApp::new().await;
    assert_eq!(app.project().await.version, 0);

    let figures = app.folder(None, "figures").await;
    assert_eq!(app.project().await.version, 1);

    let doc = app.doc(None, "main.tex").await;
    assert_eq!(app.project().await.version, 2);

    app.handler
        .move_entity(app.project_id, doc, figures, EntityType::Doc, &app.ctx)
        .await
        .unwrap();
    assert_eq!(app.project().await.version, 3);

    let update = app.history.structure_updates().pop().unwrap();
    assert_eq!(update.new_project.version, 3);

    app.handler
        .rename_entity(app.project_id, doc, EntityType::Doc, "thesis.tex", &app.ctx)
        .await
        .unwrap();
    assert_eq!(app.project().await.version, 4);

    app.handler
        .delete_entity(app.project_id, figures, EntityType::Folder, &app.ctx)
        .await
        .unwrap();
    assert_eq!(app.project().await.version, 5);
}

#[tokio::test]
async fn test_duplicate_name_is_rejected_case_sensitively() {
    let app = helpers::TestApp::new().await;
    app.doc(None, "main.tex").await;

    let err = app
        .handler
        .add_doc(app.project_id, None, "main.tex", Vec::new(), &app.ctx)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DuplicateName);

    app.handler
        .add_doc(app.project_id, None, "Main.tex", Vec::new(), &app.ctx)
        .await
        .unwrap();
    assert_eq!(app.project().await.root_folder.docs.len(), 2);
}

#[tokio::test]
async fn test_invalid_names_are_rejected() {
    let app = helpers::TestApp::new().await;
    for name in ["", "a/b.tex", "star*.tex", ".."] {
        let err = app
            .handler
            .add_doc(app.project_id, None, name, Vec::new(), &app.ctx)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidName, "name {name:?}");
    }

    let err = app
        .handler
        .add_doc(app.project_id, None, "prototype", Vec::new(), &app.ctx)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidName);

    let nested = app.folder(None, "src").await;
    app.handler
        .add_doc(app.project_id, Some(nested), "prototype", Vec::new(), &app.ctx)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_folder_moves_into_sibling_with_shared_prefix() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "a").await;
    let ab = app.folder(None, "ab").await;
    app.doc(Some(a), "inner.tex").await;

    let outcome = app
        .handler
        .move_entity(app.project_id, a, ab, EntityType::Folder, &app.ctx)
        .await
        .unwrap();
    assert_eq!(outcome.start_path, "/a");
    assert_eq!(outcome.end_path, "/ab/a");
    assert_eq!(outcome.changes.old_docs[0].path, "/a/inner.tex");
    assert_eq!(outcome.changes.new_docs[0].path, "/ab/a/inner.tex");

    let listing = list_all(&app.project().await);
    let docs: Vec<&str> = listing.docs.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(docs, vec!["ab/a/inner.tex"]);
}

#[tokio::test]
async fn test_folder_cannot_move_below_itself() {
    let app = helpers::TestApp::new().await;
    let a = app.folder(None, "a").await;
    let b = app.folder(Some(a), "b").await;

    let err = app
        .handler
        .move_entity(app.project_id, a, b, EntityType::Folder, &app.ctx)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidName);

    let err = app
        .handler
        .move_entity(app.project_id, a, a, EntityType::Folder, &app.ctx)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidName);
    assert_eq!(app.project().await.version, 2);
}

#[tokio::test]
async fn test_rename_folder_reports_descendant_paths() {
    let app = helpers::TestApp::new().await;
    let chapters = app.folder(None, "chapters").await;
    app.doc(Some(chapters), "intro.tex").await;

    let outcome = app
        .handler
        .rename_entity(
            app.project_id,
            chapters,
            EntityType::Folder,
            "parts",
            &app.ctx,
        )
        .await
        .unwrap();
    assert_eq!(outcome.end_path, "/parts");
    assert_eq!(outcome.changes.new_docs[0].path, "/parts/intro.tex");
    assert!(matches!(
        app.tpds.calls().last(),
        Some(SyncCall::MoveEntity(m)) if m.start_path == "/chapters" && m.end_path == "/parts"
    ));
    assert_eq!(app.realtime.event_names().last(), Some(&"reciveEntityRename"));
}

#[tokio::test]
async fn test_delete_folder_records_descendants_and_unsets_root_doc() {
    let app = helpers::TestApp::new().await;
    let chapters = app.folder(None, "chapters").await;
    let intro = app.doc(Some(chapters), "intro.tex").await;
    app.handler
        .set_root_doc(app.project_id, intro)
        .await
        .unwrap();

    app.handler
        .delete_entity(app.project_id, chapters, EntityType::Folder, &app.ctx)
        .await
        .unwrap();

    let project = app.project().await;
    assert!(project.root_folder.folders.is_empty());
    assert_eq!(project.root_doc_id, None);
    assert_eq!(project.deleted_docs.len(), 1);
    assert_eq!(project.deleted_docs[0].id, intro);
    assert_eq!(app.content.live_doc_count(app.project_id), 0);

    let update = app.history.structure_updates().pop().unwrap();
    assert_eq!(update.old_docs[0].path, "/chapters/intro.tex");
    assert!(update.new_docs.is_empty());
    assert_eq!(app.realtime.event_names().last(), Some(&"removeEntity"));
}

#[tokio::test]
async fn test_delete_by_path_is_case_sensitive() {
    let app = helpers::TestApp::new().await;
    let chapters = app.folder(None, "chapters").await;
    let intro = app.doc(Some(chapters), "intro.tex").await;

    let err = app
        .handler
        .delete_entity_with_path(app.project_id, "/Chapters/intro.tex", &app.ctx)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let deleted = app
        .handler
        .delete_entity_with_path(app.project_id, "/chapters/intro.tex", &app.ctx)
        .await
        .unwrap();
    assert_eq!(deleted, intro);
}

#[tokio::test]
async fn test_mkdirp_is_case_sensitive_by_default() {
    let app = helpers::TestApp::new().await;
    let first = app
        .handler
        .mkdirp(app.project_id, "/chapters/appendix", &app.ctx)
        .await
        .unwrap();
    assert_eq!(first.new_folders.len(), 2);

    let again = app
        .handler
        .mkdirp_case_insensitive(app.project_id, "/Chapters/Appendix", &app.ctx)
        .await
        .unwrap();
    assert!(again.new_folders.is_empty());
    assert_eq!(again.folder.id, first.folder.id);

    let exact = app
        .handler
        .mkdirp(app.project_id, "/Chapters/Appendix", &app.ctx)
        .await
        .unwrap();
    assert_eq!(exact.new_folders.len(), 2);
    assert_eq!(app.project().await.root_folder.folders.len(), 2);
    assert_eq!(
        app.realtime
            .event_names()
            .iter()
            .filter(|name| **name == "reciveNewFolder")
            .count(),
        4
    );
}

#[tokio::test]
async fn test_entity_limit() {
    let mut config = projtree_core::config::AppConfig::default();
    config.project.max_entities = 2;
    let app = helpers::TestApp::with_config(config).await;

    let folder = app.folder(None, "a").await;
    app.doc(Some(folder), "b.tex").await;
    let err = app
        .handler
        .add_doc(app.project_id, None, "c.tex", Vec::new(), &app.ctx)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::EntityLimitExceeded);

    let root = app.root_id().await;
    let doc = app.project().await.root_folder.folders[0].docs[0].id;
    app.handler
        .move_entity(app.project_id, doc, root, EntityType::Doc, &app.ctx)
        .await
        .unwrap();
}
