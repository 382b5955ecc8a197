//! SQLite persistence for dieta.
//!
//! The database holds a single table of serialized blobs keyed by name. It
//! knows nothing about diet plans; `dieta-core` decides what goes in a blob.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
