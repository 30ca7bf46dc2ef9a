//! Tagged union over tree elements.

use serde::{Deserialize, Serialize};

use projtree_core::types::id::EntityId;

use super::kind::EntityType;
use crate::doc::Doc;
use crate::file::FileRef;
use crate::folder::Folder;

/// Common view over docs, files, and folders.
pub trait TreeEntity {
    /// Entity id.
    fn id(&self) -> EntityId;
    /// Entity name.
    fn name(&self) -> &str;
    /// Entity kind.
    fn entity_type(&self) -> EntityType;
}

impl TreeEntity for Doc {
    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn entity_type(&self) -> EntityType {
        EntityType::Doc
    }
}

impl TreeEntity for FileRef {
    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn entity_type(&self) -> EntityType {
        EntityType::File
    }
}

impl TreeEntity for Folder {
    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn entity_type(&self) -> EntityType {
        EntityType::Folder
    }
}

/// An owned tree element of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entity {
    /// A doc.
    Doc(Doc),
    /// A file reference.
    File(FileRef),
    /// A folder, including its whole subtree.
    Folder(Folder),
}

impl Entity {
    /// Return the inner folder, if this is one.
    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Self::Folder(folder) => Some(folder),
            _ => None,
        }
    }

    /// Return the inner doc, if this is one.
    pub fn as_doc(&self) -> Option<&Doc> {
        match self {
            Self::Doc(doc) => Some(doc),
            _ => None,
        }
    }

    /// Return the inner file, if this is one.
    pub fn as_file(&self) -> Option<&FileRef> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }

    /// Replace the entity name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        match self {
            Self::Doc(doc) => doc.name = name,
            Self::File(file) => file.name = name,
            Self::Folder(folder) => folder.name = name,
        }
    }
}

impl TreeEntity for Entity {
    fn id(&self) -> EntityId {
        match self {
            Self::Doc(doc) => doc.id,
            Self::File(file) => file.id,
            Self::Folder(folder) => folder.id,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Doc(doc) => &doc.name,
            Self::File(file) => &file.name,
            Self::Folder(folder) => &folder.name,
        }
    }

    fn entity_type(&self) -> EntityType {
        match self {
            Self::Doc(_) => EntityType::Doc,
            Self::File(_) => EntityType::File,
            Self::Folder(_) => EntityType::Folder,
        }
    }
}

impl From<Doc> for Entity {
    fn from(doc: Doc) -> Self {
        Self::Doc(doc)
    }
}

impl From<FileRef> for Entity {
    fn from(file: FileRef) -> Self {
        Self::File(file)
    }
}

impl From<Folder> for Entity {
    fn from(folder: Folder) -> Self {
        Self::Folder(folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_accessors() {
        let mut entity = Entity::from(Doc::new("main.tex"));
        assert_eq!(entity.entity_type(), EntityType::Doc);
        assert_eq!(entity.name(), "main.tex");
        entity.set_name("paper.tex");
        assert_eq!(entity.as_doc().map(|d| d.name.as_str()), Some("paper.tex"));
        assert!(entity.as_folder().is_none());
    }

    #[test]
    fn test_tagged_serde() {
        let entity = Entity::from(Folder::new("chapters"));
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "folder");
        assert_eq!(json["name"], "chapters");
    }
}
