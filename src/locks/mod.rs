//! Server lock for worldsync.
//!
//! The lock is a single object, `server.lock`, in the sync bucket. Its
//! existence means some host is running (or crashed while running) the game
//! server; its body records who took it and when.
//!
//! # Lock Record
//!
//! The object body is pretty-printed JSON:
//! - `hostname`: host that acquired the lock
//! - `timestamp`: ISO-8601 UTC acquisition time
//! - `pid`: process id of the acquiring `worldsync` invocation
//!
//! # Acquisition
//!
//! Acquisition first reads the lock to report an existing holder, then
//! writes with create-only-if-absent semantics so two hosts racing past the
//! read cannot both win. Stores without conditional writes fall back to a
//! plain put, which makes the lock advisory.
//!
//! There is no expiry. A lock left behind by a crashed host has to be
//! removed by hand (`worldsync unlock` or deleting the object).

mod manager;
mod record;
mod types;


// Re-export public API
pub use manager::LockManager;
pub use record::{LockRecord, LockTime, local_hostname};
pub use types::ReleaseOutcome;
