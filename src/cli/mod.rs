//! CLI interface and argument parsing
//!
//! This module builds the command line from the loaded manifest, prints
//! listings and generates shell completions.

pub mod app;
pub mod print;

// Re-export main types
pub use app::*;
pub use print::*;
