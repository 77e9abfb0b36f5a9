//! Manifest parsing and validation
//!
//! This module handles reading grml.yaml files and checking their
//! structure before a node tree is built from them.

pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use types::*;
