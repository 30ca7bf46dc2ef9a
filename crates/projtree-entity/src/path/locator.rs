//! Index-path locators.
//!
//! A [`Locator`] identifies a storage position inside a project document as
//! a sequence of `(collection, index)` steps starting at the root folder.
//! Rendered, it reads like `rootFolder.0.folders.1.docs.0`. Locators are
//! only valid against the project version they were computed from; the
//! store re-checks the target before applying an update.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use projtree_core::AppError;

use crate::entity::EntityType;

/// Child collection of a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    /// Nested folders.
    Folders,
    /// Docs.
    Docs,
    /// File references.
    FileRefs,
}

impl Collection {
    /// Storage key for this collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folders => "folders",
            Self::Docs => "docs",
            Self::FileRefs => "fileRefs",
        }
    }

    /// Entity type stored in this collection.
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Folders => EntityType::Folder,
            Self::Docs => EntityType::Doc,
            Self::FileRefs => EntityType::File,
        }
    }
}

impl From<EntityType> for Collection {
    fn from(entity_type: EntityType) -> Self {
        match entity_type {
            EntityType::Folder => Self::Folders,
            EntityType::Doc => Self::Docs,
            EntityType::File => Self::FileRefs,
        }
    }
}

/// One step of a locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocatorStep {
    /// Collection of the parent folder being indexed.
    pub collection: Collection,
    /// Position within that collection.
    pub index: usize,
}

/// Index path from the root folder to an element.
///
/// The empty locator designates the root folder itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    steps: Vec<LocatorStep>,
}

impl Locator {
    /// Locator of the root folder.
    pub fn root() -> Self {
        Self::default()
    }

    /// Locator of the `index`-th element of `collection` below this position.
    pub fn child(&self, collection: Collection, index: usize) -> Self {
        let mut steps = self.steps.clone();
        steps.push(LocatorStep { collection, index });
        Self { steps }
    }

    /// Steps from the root.
    pub fn steps(&self) -> &[LocatorStep] {
        &self.steps
    }

    /// Whether this designates the root folder.
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Final step, absent for the root folder.
    pub fn last(&self) -> Option<&LocatorStep> {
        self.steps.last()
    }

    /// Locator of the containing folder, absent for the root folder.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.steps.split_last()?;
        Some(Self {
            steps: rest.to_vec(),
        })
    }

    /// Whether `self` is `other` or lies below it.
    pub fn starts_with(&self, other: &Locator) -> bool {
        self.steps.starts_with(&other.steps)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rootFolder.0")?;
        for step in &self.steps {
            write!(f, ".{}.{}", step.collection.as_str(), step.index)?;
        }
        Ok(())
    }
}

impl FromStr for Locator {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::validation(format!("Invalid locator: '{s}'"));
        let rest = s.strip_prefix("rootFolder.0").ok_or_else(invalid)?;
        let parts: Vec<&str> = rest.split('.').skip(1).collect();
        if !rest.is_empty() && (parts.len() % 2 != 0 || !rest.starts_with('.')) {
            return Err(invalid());
        }

        let mut steps = Vec::with_capacity(parts.len() / 2);
        for pair in parts.chunks(2) {
            let collection = match pair[0] {
                "folders" => Collection::Folders,
                "docs" => Collection::Docs,
                "fileRefs" => Collection::FileRefs,
                _ => return Err(invalid()),
            };
            let index = pair[1].parse::<usize>().map_err(|_| invalid())?;
            steps.push(LocatorStep { collection, index });
        }
        Ok(Self { steps })
    }
}
