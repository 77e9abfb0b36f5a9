//! grml - a manifest driven task runner
//!
//! Commands or targets are declared in a `grml.yaml` file together with
//! environment variables and options. grml orders the requested nodes by
//! their dependencies and runs each script at most once per invocation.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod project;
pub mod runner;

// Re-export commonly used types
pub use error::{GrmlError, Result};
pub use project::Project;

/// Current version of grml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
