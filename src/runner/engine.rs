//! Execution engine
//!
//! Walks a [`Schedule`] strictly in order, decides for every node whether it
//! has to run and runs it. The first failure stops the walk.

use crate::config::Interpreter;
use crate::error::{ExecutionResult, Result};
use crate::runner::{
    compose_script, run_script, schedule, Decision, Environment, ExecutionContext, NodeId,
    NodeTree, OptionStore, RunPolicy, Schedule, Verbosity,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Nodes that ran and nodes that were skipped, in schedule order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ran: Vec<String>,
    pub skipped: Vec<String>,
}

impl RunSummary {
    pub fn ran_count(&self) -> usize {
        self.ran.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn did_run(&self, path: &str) -> bool {
        self.ran.iter().any(|p| p == path)
    }
}

/// Runs scheduled nodes of one loaded project
pub struct Engine<'a> {
    tree: &'a NodeTree,
    env: &'a Environment,
    options: &'a OptionStore,
    root: &'a Path,
    interpreter: Interpreter,
    imports: &'a [String],
    verbosity: Verbosity,
}

impl<'a> Engine<'a> {
    pub fn new(
        tree: &'a NodeTree,
        env: &'a Environment,
        options: &'a OptionStore,
        root: &'a Path,
    ) -> Self {
        Engine {
            tree,
            env,
            options,
            root,
            interpreter: Interpreter::default(),
            imports: &[],
            verbosity: Verbosity::default(),
        }
    }

    pub fn with_interpreter(mut self, interpreter: Interpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_imports(mut self, imports: &'a [String]) -> Self {
        self.imports = imports;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Schedule and run the named nodes
    pub fn run<S: AsRef<str>>(&self, names: &[S]) -> Result<RunSummary> {
        self.run_with_args(names, &BTreeMap::new())
    }

    /// Like [`Engine::run`], binding `args` as extra variables of the requested nodes
    pub fn run_with_args<S: AsRef<str>>(
        &self,
        names: &[S],
        args: &BTreeMap<String, String>,
    ) -> Result<RunSummary> {
        let schedule = schedule(self.tree, names)?;
        Ok(self.execute(&schedule, args)?)
    }

    /// Run an already validated schedule
    pub fn execute(
        &self,
        schedule: &Schedule,
        args: &BTreeMap<String, String>,
    ) -> ExecutionResult<RunSummary> {
        let policy = RunPolicy::from(self.tree.variant());
        let mut ctx = ExecutionContext::new();
        let mut summary = RunSummary::default();

        for step in schedule.steps() {
            for &id in &step.order {
                let path = &self.tree.node(id).path;

                match policy.decide(self.tree, id, &ctx, self.root)? {
                    Decision::Skip(reason) => {
                        log::debug!("skip {}: {}", path, reason);
                        self.verbosity.print_skip(path, &reason.to_string());
                        ctx.mark_skipped(id);
                        summary.skipped.push(path.clone());
                    }
                    Decision::Run(reason) => {
                        log::debug!("run {}: {:?}", path, reason);
                        let bound = if id == step.root { Some(args) } else { None };
                        self.run_node(id, bound)?;
                        ctx.mark_ran(id);
                        summary.ran.push(path.clone());
                    }
                }
            }
        }

        log::debug!(
            "{} node(s) ran, {} skipped",
            summary.ran_count(),
            summary.skipped_count()
        );
        Ok(summary)
    }

    /// Environment handed to a node's script
    ///
    /// Later layers win: resolved environment, then options, then args.
    pub fn process_env(&self, args: Option<&BTreeMap<String, String>>) -> BTreeMap<String, String> {
        let mut vars = self.env.vars().clone();
        vars.extend(self.options.env_vars());
        if let Some(args) = args {
            vars.extend(args.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        vars
    }

    fn run_node(&self, id: NodeId, args: Option<&BTreeMap<String, String>>) -> ExecutionResult<()> {
        let node = self.tree.node(id);
        self.verbosity.print_exec(&node.path);

        if !node.has_script() {
            return Ok(());
        }

        let script = compose_script(&node.script, self.imports, self.verbosity.is_verbose());
        run_script(
            &node.path,
            &script,
            self.interpreter,
            self.root,
            &self.process_env(args),
        )
    }
}
