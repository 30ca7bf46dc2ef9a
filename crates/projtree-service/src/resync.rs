//! Whole-tree reconciliation.
//!
//! A resync repairs names that are illegal or clash with a sibling, then
//! hands the corrected listing of docs and files to the history service.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use projtree_core::error::AppError;
use projtree_core::result::AppResult;
use projtree_core::types::id::{EntityId, ProjectId};
use projtree_database::ProjectStore;
use projtree_entity::{DocListing, Entity, EntityType, FileListing, Folder, Project, TreeEntity};

use crate::collaborators::HistoryService;
use crate::context::RequestContext;
use crate::entities::join;
use crate::mutator::TreeMutator;
use crate::safe_path::clean_element_name;

/// Name given to entities whose cleaned name is empty.
pub const UNTITLED: &str = "untitled";

/// One entity renamed by a resync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResyncRename {
    /// Entity id.
    pub id: EntityId,
    /// Entity kind.
    pub entity_type: EntityType,
    /// Name before the resync.
    pub old_name: String,
    /// Name after the resync.
    pub new_name: String,
    /// Full path after the resync, without a leading slash.
    pub path: String,
}

/// Summary of a resync.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResyncReport {
    /// Entities that had to be renamed, in discovery order.
    pub renamed: Vec<ResyncRename>,
    /// Docs sent to the history service.
    pub docs: Vec<DocListing>,
    /// Files sent to the history service.
    pub files: Vec<FileListing>,
}

/// Repairs a project tree and resynchronizes the history service.
#[derive(Debug, Clone)]
pub struct ResyncReconciler {
    store: Arc<dyn ProjectStore>,
    mutator: TreeMutator,
    history: Arc<dyn HistoryService>,
}

impl ResyncReconciler {
    /// Creates a new reconciler.
    pub fn new(
        store: Arc<dyn ProjectStore>,
        mutator: TreeMutator,
        history: Arc<dyn HistoryService>,
    ) -> Self {
        Self {
            store,
            mutator,
            history,
        }
    }

    /// Run a resync for `project_id`.
    ///
    /// Fails with `ProjectHistoryDisabled` before touching anything when the
    /// project is missing or has no history id.
    pub async fn resync(
        &self,
        project_id: ProjectId,
        ctx: &RequestContext,
    ) -> AppResult<ResyncReport> {
        let project = self.store.find(project_id).await?;
        let Some((project, history_id)) = project.and_then(|p| {
            let history_id = p.history_id()?.to_string();
            Some((p, history_id))
        }) else {
            return Err(AppError::project_history_disabled(format!(
                "project history not enabled for {project_id}"
            )));
        };

        let plan = plan_fixes(&project);

        // Later entries may hold a name an earlier entry is about to take,
        // so they are renamed first.
        for rename in plan.renamed.iter().rev() {
            debug!(
                project_id = %project_id,
                entity_id = %rename.id,
                from = %rename.old_name,
                to = %rename.new_name,
                "Resync renaming entity"
            );
            self.mutator
                .rename_entity(
                    project_id,
                    rename.id,
                    rename.entity_type,
                    &rename.new_name,
                    ctx,
                )
                .await?;
        }

        self.history
            .resync_project_history(
                project_id,
                &history_id,
                plan.docs.clone(),
                plan.files.clone(),
            )
            .await?;

        info!(
            project_id = %project_id,
            renamed = plan.renamed.len(),
            docs = plan.docs.len(),
            files = plan.files.len(),
            "Project history resynced"
        );
        Ok(plan)
    }
}

/// An entity found during the walk, with the id of its folder.
struct Discovered {
    entity: Entity,
    parent_id: EntityId,
}

/// Compute the renames a resync needs and the corrected listings.
///
/// Folders are processed first, then docs, then files. A folder only clashes
/// with other folder paths; docs and files clash with any path.
pub fn plan_fixes(project: &Project) -> ResyncReport {
    let mut folders = Vec::new();
    let mut docs = Vec::new();
    let mut files = Vec::new();
    discover(&project.root_folder, &mut folders, &mut docs, &mut files);

    let mut fixed_dirs: HashMap<EntityId, String> = HashMap::new();
    fixed_dirs.insert(project.root_folder.id, String::new());
    let mut folder_paths = HashSet::new();
    let mut all_paths = HashSet::new();
    let mut report = ResyncReport::default();

    let root_id = project.root_folder.id;
    for found in folders {
        let dir = fixed_dirs.get(&found.parent_id).cloned().unwrap_or_default();
        let (name, path) = fix_name(&found, root_id, &dir, &folder_paths);
        folder_paths.insert(path.clone());
        all_paths.insert(path.clone());
        fixed_dirs.insert(found.entity.id(), path.clone());
        record_rename(&mut report, &found.entity, &name, &path);
    }

    for found in docs.into_iter().chain(files) {
        let dir = fixed_dirs.get(&found.parent_id).cloned().unwrap_or_default();
        let (name, path) = fix_name(&found, root_id, &dir, &all_paths);
        all_paths.insert(path.clone());
        record_rename(&mut report, &found.entity, &name, &path);

        let mut entity = found.entity;
        entity.set_name(name);
        match entity {
            Entity::Doc(doc) => report.docs.push(DocListing { doc, path }),
            Entity::File(file) => report.files.push(FileListing { file, path }),
            Entity::Folder(_) => {}
        }
    }

    report
}

fn discover(
    folder: &Folder,
    folders: &mut Vec<Discovered>,
    docs: &mut Vec<Discovered>,
    files: &mut Vec<Discovered>,
) {
    for doc in &folder.docs {
        docs.push(Discovered {
            entity: Entity::Doc(doc.clone()),
            parent_id: folder.id,
        });
    }
    for file in &folder.file_refs {
        files.push(Discovered {
            entity: Entity::File(file.clone()),
            parent_id: folder.id,
        });
    }
    for child in &folder.folders {
        folders.push(Discovered {
            entity: Entity::Folder(Folder {
                folders: Vec::new(),
                docs: Vec::new(),
                file_refs: Vec::new(),
                ..child.clone()
            }),
            parent_id: folder.id,
        });
        discover(child, folders, docs, files);
    }
}

fn record_rename(report: &mut ResyncReport, entity: &Entity, new_name: &str, path: &str) {
    if entity.name() != new_name {
        report.renamed.push(ResyncRename {
            id: entity.id(),
            entity_type: entity.entity_type(),
            old_name: entity.name().to_string(),
            new_name: new_name.to_string(),
            path: path.to_string(),
        });
    }
}

/// Clean the name of `found` and suffix it until its path in `dir` is not
/// in `taken`.
fn fix_name(
    found: &Discovered,
    root_id: EntityId,
    dir: &str,
    taken: &HashSet<String>,
) -> (String, String) {
    let mut fixed = clean_element_name(
        found.entity.name(),
        found.entity.entity_type(),
        found.parent_id == root_id,
    );
    if fixed.is_empty() {
        fixed = UNTITLED.to_string();
    }

    let mut path = join(dir, &fixed);
    if !taken.contains(&path) {
        return (fixed, path);
    }

    let (stem, mut n) = split_suffix(&fixed);
    loop {
        n += 1;
        let candidate = format!("{stem} ({n})");
        path = join(dir, &candidate);
        if !taken.contains(&path) {
            return (candidate, path);
        }
    }
}

/// Split a trailing ` (n)` off `name`, returning the stem and `n`.
fn split_suffix(name: &str) -> (&str, u64) {
    let parsed = name
        .strip_suffix(')')
        .and_then(|rest| rest.rsplit_once(" ("))
        .and_then(|(stem, digits)| {
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            digits.parse::<u64>().ok().map(|n| (stem, n))
        });
    parsed.unwrap_or((name, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use projtree_core::config::{LockConfig, ProjectLimitsConfig};
    use projtree_core::error::ErrorKind;
    use projtree_core::types::id::UserId;
    use projtree_database::stores::memory::MemoryProjectStore;
    use projtree_entity::{Doc, FileRef};
    use projtree_lock::LockManager;

    use crate::collaborators::memory::{HistoryCall, RecordingHistory};

    fn reconciler(store: Arc<MemoryProjectStore>) -> (ResyncReconciler, Arc<RecordingHistory>) {
        let history = Arc::new(RecordingHistory::new());
        let mutator = TreeMutator::new(
            store.clone(),
            LockManager::new(&LockConfig::default()),
            &ProjectLimitsConfig::default(),
        );
        (
            ResyncReconciler::new(store, mutator, history.clone()),
            history,
        )
    }

    fn names(folder: &Folder) -> Vec<String> {
        let mut names: Vec<String> = folder
            .docs
            .iter()
            .map(|d| d.name.clone())
            .chain(folder.file_refs.iter().map(|f| f.name.clone()))
            .chain(folder.folders.iter().map(|f| f.name.clone()))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_split_suffix() {
        assert_eq!(split_suffix("another dupe (22)"), ("another dupe", 22));
        assert_eq!(split_suffix("duplicate.tex"), ("duplicate.tex", 0));
        assert_eq!(split_suffix("odd ()"), ("odd ()", 0));
        assert_eq!(split_suffix("x (a1)"), ("x (a1)", 0));
    }

    #[test]
    fn test_plan_fixes_names() {
        let mut project = Project::new("thesis", UserId::new());
        let root = &mut project.root_folder;
        root.folders.push(Folder::new("chapters"));
        for _ in 0..3 {
            root.docs.push(Doc::new("duplicate.tex"));
        }
        root.docs.push(Doc::new("another dupe (22)"));
        root.docs.push(Doc::new("another dupe (22)"));
        root.docs.push(Doc::new(""));
        root.docs.push(Doc::new("chapters"));
        root.file_refs.push(FileRef::new("A*.png"));
        root.file_refs.push(FileRef::new("A_.png"));

        let plan = plan_fixes(&project);
        let renamed: Vec<&str> = plan.renamed.iter().map(|r| r.new_name.as_str()).collect();
        assert_eq!(
            renamed,
            vec![
                "duplicate.tex (1)",
                "duplicate.tex (2)",
                "another dupe (23)",
                "untitled",
                "chapters (1)",
                "A_.png",
                "A_.png (1)",
            ]
        );

        let doc_paths: Vec<&str> = plan.docs.iter().map(|d| d.path.as_str()).collect();
        assert!(doc_paths.contains(&"duplicate.tex (2)"));
        assert!(plan.files.iter().all(|f| !f.path.starts_with('/')));
    }

    #[test]
    fn test_plan_fixes_uses_fixed_folder_paths() {
        let mut project = Project::new("thesis", UserId::new());
        let mut first = Folder::new("dup");
        first.docs.push(Doc::new("x.tex"));
        let mut second = Folder::new("dup");
        second.docs.push(Doc::new("x.tex"));
        project.root_folder.folders.push(first);
        project.root_folder.folders.push(second);

        let plan = plan_fixes(&project);
        assert_eq!(plan.renamed.len(), 1);
        assert_eq!(plan.renamed[0].new_name, "dup (1)");
        let paths: Vec<&str> = plan.docs.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["dup/x.tex", "dup (1)/x.tex"]);
    }

    #[test]
    fn test_plan_fixes_keeps_blocked_names_where_valid() {
        let mut project = Project::new("thesis", UserId::new());
        let mut constructor = Folder::new("constructor");
        constructor.docs.push(Doc::new("prototype"));
        project.root_folder.folders.push(constructor);

        let plan = plan_fixes(&project);
        assert!(plan.renamed.is_empty());
        assert_eq!(plan.docs[0].path, "constructor/prototype");

        project.root_folder.file_refs.push(FileRef::new("valueOf"));
        let plan = plan_fixes(&project);
        assert_eq!(plan.renamed.len(), 1);
        assert_eq!(plan.renamed[0].new_name, "@valueOf");
    }

    #[tokio::test]
    async fn test_resync_renames_and_notifies_history() {
        let store = Arc::new(MemoryProjectStore::new());
        let mut project = Project::new("thesis", UserId::new()).with_history("h-42");
        for _ in 0..3 {
            project.root_folder.docs.push(Doc::new("duplicate.tex"));
        }
        // Already holds the name the second duplicate wants.
        project.root_folder.docs.push(Doc::new("duplicate.tex (1)"));
        store.insert(&project).await.unwrap();

        let (reconciler, history) = reconciler(store.clone());
        let report = reconciler
            .resync(project.id, &RequestContext::system("resync"))
            .await
            .unwrap();
        assert_eq!(report.renamed.len(), 3);

        let stored = store.get(project.id).await.unwrap();
        assert_eq!(
            names(&stored.root_folder),
            vec![
                "duplicate.tex",
                "duplicate.tex (1)",
                "duplicate.tex (2)",
                "duplicate.tex (3)",
            ]
        );

        let calls = history.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            HistoryCall::Resync {
                history_id, docs, ..
            } => {
                assert_eq!(history_id, "h-42");
                assert_eq!(docs.len(), 4);
            }
            other => panic!("unexpected history call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resync_without_history_id() {
        let store = Arc::new(MemoryProjectStore::new());
        let mut project = Project::new("thesis", UserId::new());
        project.root_folder.docs.push(Doc::new("a*b.tex"));
        store.insert(&project).await.unwrap();

        let (reconciler, history) = reconciler(store.clone());
        let err = reconciler
            .resync(project.id, &RequestContext::system("resync"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ProjectHistoryDisabled);
        assert!(history.calls().is_empty());
        assert_eq!(store.get(project.id).await.unwrap().version, 0);

        let missing = reconciler
            .resync(ProjectId::new(), &RequestContext::system("resync"))
            .await
            .unwrap_err();
        assert_eq!(missing.kind, ErrorKind::ProjectHistoryDisabled);
    }
}
