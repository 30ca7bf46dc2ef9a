//! Entity type enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three kinds of element a project tree holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// An editable text document.
    Doc,
    /// A binary file reference.
    File,
    /// A folder.
    Folder,
}

impl EntityType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::File => "file",
            Self::Folder => "folder",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = projtree_core::AppError;

    /// Accepts singular, plural, and collection spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doc" | "docs" => Ok(Self::Doc),
            "file" | "files" | "fileRefs" => Ok(Self::File),
            "folder" | "folders" => Ok(Self::Folder),
            _ => Err(projtree_core::AppError::validation(format!(
                "Invalid entity type: '{s}'. Expected one of: doc, file, folder"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_parsing() {
        assert_eq!("docs".parse::<EntityType>().unwrap(), EntityType::Doc);
        assert_eq!("fileRefs".parse::<EntityType>().unwrap(), EntityType::File);
        assert_eq!("files".parse::<EntityType>().unwrap(), EntityType::File);
        assert_eq!("folder".parse::<EntityType>().unwrap(), EntityType::Folder);
        assert!("Folder".parse::<EntityType>().is_err());
    }
}
