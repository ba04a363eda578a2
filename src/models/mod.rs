//! Data models for workflow state and configuration.

pub mod config;
pub mod state;
