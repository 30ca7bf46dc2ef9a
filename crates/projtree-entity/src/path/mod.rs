//! Positional locators and derived entity paths.

pub mod locator;
pub mod model;

pub use locator::{Collection, Locator, LocatorStep};
pub use model::EntityPath;
