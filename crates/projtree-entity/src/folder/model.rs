//! Folder entity model.

use serde::{Deserialize, Serialize};

use projtree_core::types::id::EntityId;

use crate::doc::Doc;
use crate::file::FileRef;
use crate::path::{Collection, Locator};

/// A folder in the project tree.
///
/// Children are kept in three ordered collections. Names are unique across
/// all three collections of a single folder (case-sensitive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique folder identifier.
    pub id: EntityId,
    /// Folder name. The root folder is conventionally named `rootFolder`.
    pub name: String,
    /// Child folders.
    #[serde(default)]
    pub folders: Vec<Folder>,
    /// Child docs.
    #[serde(default)]
    pub docs: Vec<Doc>,
    /// Child file references.
    #[serde(default)]
    pub file_refs: Vec<FileRef>,
}

impl Folder {
    /// Create an empty folder with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(EntityId::new(), name)
    }

    /// Create an empty folder with a known id.
    pub fn with_id(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            folders: Vec::new(),
            docs: Vec::new(),
            file_refs: Vec::new(),
        }
    }

    /// Whether the folder has no children at all.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.docs.is_empty() && self.file_refs.is_empty()
    }

    /// Whether any direct child (doc, file, or folder) is named `name`.
    pub fn has_child_named(&self, name: &str) -> bool {
        self.docs.iter().any(|d| d.name == name)
            || self.file_refs.iter().any(|f| f.name == name)
            || self.folders.iter().any(|f| f.name == name)
    }

    /// Count every doc, file, and folder below this folder (itself excluded).
    pub fn count_descendants(&self) -> usize {
        self.docs.len()
            + self.file_refs.len()
            + self
                .folders
                .iter()
                .map(|f| 1 + f.count_descendants())
                .sum::<usize>()
    }

    /// Count docs and files below this folder.
    pub fn count_docs_and_files(&self) -> (usize, usize) {
        self.folders.iter().fold(
            (self.docs.len(), self.file_refs.len()),
            |(docs, files), child| {
                let (d, f) = child.count_docs_and_files();
                (docs + d, files + f)
            },
        )
    }

    /// Collect the ids of this folder and every descendant folder.
    pub fn folder_ids(&self) -> Vec<EntityId> {
        let mut ids = vec![self.id];
        for child in &self.folders {
            ids.extend(child.folder_ids());
        }
        ids
    }

    /// Resolve a folder locator relative to this folder.
    ///
    /// Returns `None` when the locator leaves the tree or steps through a
    /// non-folder collection.
    pub fn folder_at(&self, locator: &Locator) -> Option<&Folder> {
        let mut current = self;
        for step in locator.steps() {
            if step.collection != Collection::Folders {
                return None;
            }
            current = current.folders.get(step.index)?;
        }
        Some(current)
    }

    /// Mutable counterpart of [`Folder::folder_at`].
    pub fn folder_at_mut(&mut self, locator: &Locator) -> Option<&mut Folder> {
        let mut current = self;
        for step in locator.steps() {
            if step.collection != Collection::Folders {
                return None;
            }
            current = current.folders.get_mut(step.index)?;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Folder {
        let mut root = Folder::new("rootFolder");
        let mut chapters = Folder::new("chapters");
        chapters.docs.push(Doc::new("intro.tex"));
        chapters.folders.push(Folder::new("figures"));
        root.folders.push(chapters);
        root.docs.push(Doc::new("main.tex"));
        root.file_refs.push(FileRef::new("image.png"));
        root
    }

    #[test]
    fn test_counts() {
        let root = sample();
        assert_eq!(root.count_descendants(), 5);
        assert_eq!(root.count_docs_and_files(), (2, 1));
        assert_eq!(root.folder_ids().len(), 3);
    }

    #[test]
    fn test_has_child_named_spans_collections() {
        let root = sample();
        assert!(root.has_child_named("chapters"));
        assert!(root.has_child_named("main.tex"));
        assert!(root.has_child_named("image.png"));
        assert!(!root.has_child_named("Main.tex"));
    }

    #[test]
    fn test_folder_at() {
        let root = sample();
        let figures = Locator::root()
            .child(Collection::Folders, 0)
            .child(Collection::Folders, 0);
        assert_eq!(root.folder_at(&figures).map(|f| f.name.as_str()), Some("figures"));
        assert!(root.folder_at(&Locator::root().child(Collection::Docs, 0)).is_none());
        assert!(root.folder_at(&Locator::root().child(Collection::Folders, 3)).is_none());
    }

    #[test]
    fn test_serde_uses_file_refs_key() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("fileRefs").is_some());
    }
}
