//! Run decisions
//!
//! Commands run once per invocation. Targets additionally skip when all of
//! their outputs exist, unless a dependency ran earlier in the same
//! invocation, in which case they are forced to run again.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{ExecutionContext, NodeId, NodeTree, Variant};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// How the engine decides whether a scheduled node must run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPolicy {
    /// Skip only nodes already handled in this invocation
    Memoized,
    /// Skip handled nodes and nodes whose outputs are all present
    Staleness,
}

impl From<Variant> for RunPolicy {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Commands => RunPolicy::Memoized,
            Variant::Targets => RunPolicy::Staleness,
        }
    }
}

/// Outcome of a run decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Run(RunReason),
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReason {
    /// Memoized node not handled yet
    FirstRun,
    /// A dependency ran in this invocation
    DependencyRan(NodeId),
    /// The target declares no outputs
    NoOutputs,
    /// At least one declared output is missing
    MissingOutput(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyDone,
    UpToDate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyDone => write!(f, "already done"),
            SkipReason::UpToDate => write!(f, "up to date"),
        }
    }
}

impl RunPolicy {
    /// Decide whether `id` must run, given what already happened in `ctx`
    pub fn decide(
        self,
        tree: &NodeTree,
        id: NodeId,
        ctx: &ExecutionContext,
        root: &Path,
    ) -> ExecutionResult<Decision> {
        if ctx.is_done(id) {
            return Ok(Decision::Skip(SkipReason::AlreadyDone));
        }

        match self {
            RunPolicy::Memoized => Ok(Decision::Run(RunReason::FirstRun)),
            RunPolicy::Staleness => staleness(tree, id, ctx, root),
        }
    }
}

fn staleness(
    tree: &NodeTree,
    id: NodeId,
    ctx: &ExecutionContext,
    root: &Path,
) -> ExecutionResult<Decision> {
    let node = tree.node(id);

    if let Some(dep) = node.deps.iter().copied().find(|dep| ctx.ran(*dep)) {
        return Ok(Decision::Run(RunReason::DependencyRan(dep)));
    }

    if node.outputs.is_empty() {
        return Ok(Decision::Run(RunReason::NoOutputs));
    }

    for output in &node.outputs {
        match fs::metadata(root.join(output)) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Decision::Run(RunReason::MissingOutput(output.clone())));
            }
            Err(source) => {
                return Err(ExecutionError::Output {
                    path: node.path.clone(),
                    output: output.clone(),
                    source,
                })
            }
        }
    }

    Ok(Decision::Skip(SkipReason::UpToDate))
}
