//! Flat listings of a project tree.
//!
//! Paths are reported without a leading slash (`chapters/intro.tex`). The
//! root folder itself is not listed.

use projtree_entity::{DocListing, FileListing, Folder, FolderListing, Project};

/// Every doc, file, and folder of a project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectEntities {
    /// Docs in depth-first order.
    pub docs: Vec<DocListing>,
    /// Files in depth-first order.
    pub files: Vec<FileListing>,
    /// Folders in depth-first order, parents before children.
    pub folders: Vec<FolderListing>,
}

/// List every entity of `project`.
pub fn list_all(project: &Project) -> ProjectEntities {
    let mut entities = ProjectEntities::default();
    collect(&project.root_folder, "", &mut entities);
    entities
}

/// List every doc of `project`.
pub fn list_docs(project: &Project) -> Vec<DocListing> {
    list_all(project).docs
}

/// List every file of `project`.
pub fn list_files(project: &Project) -> Vec<FileListing> {
    list_all(project).files
}

fn collect(folder: &Folder, prefix: &str, out: &mut ProjectEntities) {
    for doc in &folder.docs {
        out.docs.push(DocListing {
            doc: doc.clone(),
            path: join(prefix, &doc.name),
        });
    }
    for file in &folder.file_refs {
        out.files.push(FileListing {
            file: file.clone(),
            path: join(prefix, &file.name),
        });
    }
    for child in &folder.folders {
        let path = join(prefix, &child.name);
        out.folders.push(FolderListing {
            folder: child.clone(),
            path: path.clone(),
        });
        collect(child, &path, out);
    }
}

/// Join a parent path and a name without introducing a leading slash.
pub(crate) fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
