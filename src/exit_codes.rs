//! Exit code constants for the worldsync CLI.
//!
//! Every failure exits with the same code so wrapper scripts only need to
//! check for zero:
//! - 0: Success (including help/version output)
//! - 1: Failure (bad command, missing configuration, lock held, store or
//!   archive error)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Any failure: usage error, configuration error, lock contention, or a
/// store/archive/filesystem error during execution.
pub const FAILURE: i32 = 1;
