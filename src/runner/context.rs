//! Per-invocation execution state
//!
//! An [`ExecutionContext`] lives for exactly one top-level invocation and is
//! dropped when it finishes. Nothing in it carries over to the next run.

use crate::runner::NodeId;
use colored::Colorize;
use std::collections::HashSet;

/// Bookkeeping for one invocation
#[derive(Debug, Default)]
pub struct ExecutionContext {
    /// Nodes already handled in this invocation, run or skipped
    done: HashSet<NodeId>,

    /// Nodes whose script actually ran in this invocation
    rerun: HashSet<NodeId>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self, id: NodeId) -> bool {
        self.done.contains(&id)
    }

    /// Record a node that was considered and did not need to run
    pub fn mark_skipped(&mut self, id: NodeId) {
        self.done.insert(id);
    }

    /// Record a node whose script ran successfully
    pub fn mark_ran(&mut self, id: NodeId) {
        self.done.insert(id);
        self.rerun.insert(id);
    }

    pub fn ran(&self, id: NodeId) -> bool {
        self.rerun.contains(&id)
    }

    pub fn done_count(&self) -> usize {
        self.done.len()
    }

    pub fn ran_count(&self) -> usize {
        self.rerun.len()
    }
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Only script output and errors
    Quiet = 0,
    /// Announce every node that runs
    #[default]
    Normal = 1,
    /// Also echo every script line (`set -x`)
    Verbose = 2,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else if quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }

    pub fn is_verbose(self) -> bool {
        self >= Verbosity::Verbose
    }

    /// Print the banner shown before a node runs
    pub fn print_exec(self, path: &str) {
        if self >= Verbosity::Normal {
            eprintln!("{} {}", "exec:".yellow().bold(), path.yellow());
        }
    }

    /// Print a note about a skipped node (verbose only)
    pub fn print_skip(self, path: &str, reason: &str) {
        if self >= Verbosity::Verbose {
            eprintln!("{} {} ({})", "skip:".dimmed(), path, reason);
        }
    }
}
