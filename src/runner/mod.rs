//! Node tree, scheduling and execution
//!
//! This module turns a parsed manifest into a linked node tree, orders the
//! requested nodes and runs their scripts.

pub mod command;
pub mod context;
pub mod engine;
pub mod interpolate;
pub mod options;
pub mod policy;
pub mod schedule;
pub mod tree;

// Re-export main types
pub use command::*;
pub use context::*;
pub use engine::*;
pub use interpolate::*;
pub use options::*;
pub use policy::*;
pub use schedule::*;
pub use tree::*;
