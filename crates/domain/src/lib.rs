//! Shared domain types for telsearch: configuration, errors, message
//! models, and trace events used by every other crate in the workspace.

pub mod config;
pub mod error;
pub mod message;
pub mod stream;
pub mod trace;
