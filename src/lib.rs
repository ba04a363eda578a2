//! Realm user provisioning for property-file backed security realms.
//!
//! Computes realm-scoped password digests and writes user and group
//! entries into one or more `.properties` files.
//!
//! ## Modules
//! - `cli` — Command-line handlers and the interactive wizard
//! - `core` — Digest, update transition, property files, audit
//! - `models` — Data structures
//! - `util` — Filesystem and journald helpers

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod util;
