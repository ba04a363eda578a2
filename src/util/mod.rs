//! Utility modules for filesystem, paths, and journald.

pub mod fs;
pub mod journald;
pub mod path;
