//! Script execution
//!
//! This module turns a node's script into a single interpreter invocation.

use crate::config::Interpreter;
use crate::error::{ExecutionError, ExecutionResult};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};

/// Build the full script handed to the interpreter
///
/// The body runs under `set -e`, with `set -x` added in verbose mode, after
/// sourcing every import relative to `${ROOT}`.
pub fn compose_script(body: &str, imports: &[String], verbose: bool) -> String {
    let mut script = String::from("set -e\n");
    if verbose {
        script.push_str("set -x\n");
    }
    for import in imports {
        script.push_str(&format!(". \"${{ROOT}}/{}\"\n", import));
    }
    script.push_str(body);
    if !body.ends_with('\n') {
        script.push('\n');
    }
    script
}

/// Run a composed script for the node at `path`
///
/// The child gets exactly `env` as its environment, runs in `root` and
/// shares stdin, stdout and stderr with this process.
pub fn run_script(
    path: &str,
    script: &str,
    interpreter: Interpreter,
    root: &Path,
    env: &BTreeMap<String, String>,
) -> ExecutionResult<()> {
    let mut command = StdCommand::new(interpreter.program());
    command
        .arg("-c")
        .arg(script)
        .current_dir(root)
        .env_clear()
        .envs(env)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    log::trace!("{}: running with {} variable(s)", path, env.len());

    let status = command.status().map_err(|source| ExecutionError::Spawn {
        path: path.to_string(),
        interpreter: interpreter.to_string(),
        source,
    })?;

    if status.success() {
        return Ok(());
    }

    match status.code() {
        Some(code) => Err(ExecutionError::Failed {
            path: path.to_string(),
            code,
        }),
        None => Err(ExecutionError::Terminated {
            path: path.to_string(),
        }),
    }
}
