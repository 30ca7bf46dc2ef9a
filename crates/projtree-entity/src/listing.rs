//! Flat listings of tree elements with their paths.
//!
//! Listing paths carry no leading slash (`a/b/c.tex`), matching what the
//! history service expects.

use serde::{Deserialize, Serialize};

use crate::doc::Doc;
use crate::file::FileRef;
use crate::folder::Folder;

/// A doc and its path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocListing {
    /// The doc.
    pub doc: Doc,
    /// Path without a leading slash.
    pub path: String,
}

/// A file and its path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileListing {
    /// The file reference.
    pub file: FileRef,
    /// Path without a leading slash.
    pub path: String,
}

/// A folder and its path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderListing {
    /// The folder.
    pub folder: Folder,
    /// Path without a leading slash.
    pub path: String,
}
