//! Configuration model for worldsync.
//!
//! The configuration is read once from the process environment at startup
//! (after an optional `.env` file has been loaded) and handed to the rest of
//! the program as an explicit [`SyncConfig`] value. Nothing reads the
//! environment after that point.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::SyncConfig;
