//! Filesystem utilities for worldsync.
//!
//! The local data directory is only ever replaced as a whole: a new tree is
//! built next to it and swapped in with renames, so a crash leaves either the
//! old tree or the new one in place. A data directory that is a mount point
//! is kept and has its contents replaced instead.

pub mod swap;

pub use swap::{remove_dir_if_exists, replace_dir};
