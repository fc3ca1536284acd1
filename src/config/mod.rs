//! Configuration for tilegif
//!
//! Provides types, discovery and loading for `tilegif.toml`.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
