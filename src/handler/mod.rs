//! Request handler module
//!
//! Composition of the frozen server configuration and per-request dispatch,
//! with static file serving as the fallback for the configured prefix.

pub mod compose;
pub mod dispatch;
pub mod static_files;

// Re-export main entry points
pub use compose::{compose, BuildError, HandlerComposer, ServerConfiguration};
pub use dispatch::{dispatch, DispatchError};
