//! Core business logic modules.

pub mod audit_log;
pub mod config;
pub mod digest;
pub mod file_lock;
pub mod handlers;
pub mod paths;
pub mod properties;
pub mod update;
