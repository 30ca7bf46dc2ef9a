//! # projtree-database
//!
//! Persistence for project documents. A project is stored whole; changes to
//! its tree are expressed as [`TreeUpdate`]s, small lists of targeted
//! operations addressed by positional locators, which every backend applies
//! atomically after re-checking that each locator still points at the
//! expected element.
//!
//! Backends:
//!
//! - **memory**: in-process store built on `dashmap`
//! - **postgres**: one JSONB document per project, updated under a row lock

#[cfg(feature = "postgres")]
pub mod connection;
pub mod provider;
pub mod store;
pub mod stores;
pub mod update;

#[cfg(feature = "postgres")]
pub use connection::DatabasePool;
pub use provider::StoreManager;
pub use store::{DeletedProjectStore, ProjectStore};
pub use update::{Touch, TreeOp, TreeUpdate};
