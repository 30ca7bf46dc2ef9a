//! # projtree-entity
//!
//! Data model for a project and its file tree. A project is a single
//! document: one root folder holding nested folders, docs, and file
//! references. Everything here derives `Serialize`/`Deserialize` so a whole
//! project round-trips through JSON (snapshots, JSONB storage).

pub mod doc;
pub mod entity;
pub mod file;
pub mod folder;
pub mod listing;
pub mod path;
pub mod project;

pub use doc::{DeletedDocRef, Doc};
pub use entity::{Entity, EntityType, TreeEntity};
pub use file::{DeletedFileRef, FileRef};
pub use folder::Folder;
pub use listing::{DocListing, FileListing, FolderListing};
pub use path::{Collection, EntityPath, Locator, LocatorStep};
pub use project::{DeletedProject, DeleterData, Project, ProjectHistory};
