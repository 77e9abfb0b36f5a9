//! Dependency ordering
//!
//! For each requested root the reachable dependency closure is ordered so
//! that every dependency comes before its dependents. Nodes without a
//! mutual constraint keep the order in which the walk first discovers them,
//! which is declaration order of the `deps` lists. The walk uses an explicit
//! stack, so cycles are found by marking rather than by running out of stack.

use crate::error::{ScheduleError, ScheduleResult};
use crate::runner::{NodeId, NodeTree};
use std::collections::HashMap;

/// Ordered work for one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    steps: Vec<Step>,
}

/// The execution order for one requested root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub root: NodeId,
    /// Closure of `root`, dependencies first, `root` last
    pub order: Vec<NodeId>,
}

impl Schedule {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Every scheduled node in order; a node shared by several roots appears
    /// once per root
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.steps.iter().flat_map(|step| step.order.iter().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current walk path
    Active,
    /// Already placed in the order
    Placed,
}

/// Validate the requested names and order each closure
///
/// Fails before anything runs if a name is unknown or any requested closure
/// contains a cycle.
pub fn schedule<S: AsRef<str>>(tree: &NodeTree, names: &[S]) -> ScheduleResult<Schedule> {
    let roots = names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            tree.find(name)
                .ok_or_else(|| ScheduleError::UnknownTarget(name.to_string()))
        })
        .collect::<ScheduleResult<Vec<NodeId>>>()?;

    schedule_ids(tree, &roots)
}

/// Order the closures of already resolved roots
pub fn schedule_ids(tree: &NodeTree, roots: &[NodeId]) -> ScheduleResult<Schedule> {
    let mut steps = Vec::with_capacity(roots.len());

    for &root in roots {
        let order = topological_order(tree, root)?;
        log::debug!(
            "schedule for {}: {}",
            tree.node(root).path,
            order
                .iter()
                .map(|id| tree.node(*id).path.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        steps.push(Step { root, order });
    }

    Ok(Schedule { steps })
}

/// Post-order walk of the closure of `root`
pub fn topological_order(tree: &NodeTree, root: NodeId) -> ScheduleResult<Vec<NodeId>> {
    let mut marks: HashMap<NodeId, Mark> = HashMap::new();
    let mut order = Vec::new();
    // (node, index of the next dependency to visit)
    let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
    marks.insert(root, Mark::Active);

    while let Some(top) = stack.last_mut() {
        let (id, next) = *top;
        let deps = &tree.node(id).deps;

        if next < deps.len() {
            top.1 += 1;
            let dep = deps[next];
            match marks.get(&dep) {
                Some(Mark::Placed) => {}
                Some(Mark::Active) => return Err(cycle_error(tree, &stack, dep)),
                None => {
                    marks.insert(dep, Mark::Active);
                    stack.push((dep, 0));
                }
            }
        } else {
            stack.pop();
            marks.insert(id, Mark::Placed);
            order.push(id);
        }
    }

    Ok(order)
}

/// Describe the cycle closed by an edge back to `dep`
fn cycle_error(tree: &NodeTree, stack: &[(NodeId, usize)], dep: NodeId) -> ScheduleError {
    let start = stack.iter().position(|(id, _)| *id == dep).unwrap_or(0);
    let mut members: Vec<String> = stack[start..]
        .iter()
        .map(|(id, _)| tree.node(*id).path.clone())
        .collect();
    members.push(tree.node(dep).path.clone());
    ScheduleError::CyclicDependency(members)
}
