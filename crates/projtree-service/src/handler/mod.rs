//! Orchestration of tree changes and their side effects.
//!
//! The handler validates input, drives the [`crate::mutator::TreeMutator`]
//! and fans the outcome out to the content store, history service,
//! third-party store and realtime rooms.

pub mod cleanup;
pub mod content;
pub mod service;

pub use service::{AddedDoc, AddedFile, Collaborators, EntityUpdateHandler};
