//! Main CLI application

use crate::cli::print::print_listing;
use crate::config::find_root;
use crate::project::Project;
use crate::runner::{NodeId, NodeTree, Variant, Verbosity};
use anyhow::{anyhow, Context as _};
use clap::error::ErrorKind;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

/// Prefix for clap ids of declared command arguments
const ARG_ID_PREFIX: &str = "arg:";

/// CLI application
pub struct App {
    /// The clap command built from the manifest
    command: Command,
    /// The loaded project
    project: Project,
}

impl App {
    /// Create an app for the project in `root`
    pub fn new(root: PathBuf) -> anyhow::Result<Self> {
        let project = Project::load(&root)
            .with_context(|| format!("Failed to load project in '{}'", root.display()))?;
        let command = build_command(&project);

        Ok(App { command, project })
    }

    /// Run the application with command line arguments
    pub fn run(mut self, args: Vec<String>) -> anyhow::Result<()> {
        let matches = match self.command.try_get_matches_from_mut(args) {
            Ok(matches) => matches,
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.print()?;
                return Ok(());
            }
            Err(e) => return Err(anyhow!("{}", e.render().to_string().trim_end())),
        };

        if let Some(shell) = matches.get_one::<Shell>("completions") {
            let name = self.command.get_name().to_string();
            clap_complete::generate(*shell, &mut self.command, name, &mut io::stdout());
            return Ok(());
        }

        if let Some(assignments) = matches.get_many::<String>("option") {
            for assignment in assignments {
                self.project
                    .options_mut()
                    .assign(assignment)
                    .with_context(|| format!("Invalid option '{}'", assignment))?;
            }
        }

        if matches.get_flag("list") {
            print_listing(&self.project);
            return Ok(());
        }

        let verbosity = get_verbosity(&matches);
        match self.project.tree().variant() {
            Variant::Commands => self.run_command(&matches, verbosity),
            Variant::Targets => self.run_targets(&matches, verbosity),
        }
    }

    /// Run the single command path selected through nested subcommands
    fn run_command(&mut self, matches: &ArgMatches, verbosity: Verbosity) -> anyhow::Result<()> {
        let tree = self.project.tree();
        let Some((id, sub_matches)) = selected_command(tree, matches) else {
            self.command.print_help()?;
            println!();
            return Ok(());
        };

        let node = tree.node(id);
        let mut args = BTreeMap::new();
        for name in &node.args {
            if let Some(value) = sub_matches.get_one::<String>(&arg_id(name)) {
                args.insert(name.clone(), value.clone());
            }
        }

        self.project
            .engine()
            .with_verbosity(verbosity)
            .run_with_args(&[node.path.as_str()], &args)
            .with_context(|| format!("Failed to run '{}'", node.path))?;
        Ok(())
    }

    /// Run the named targets, or the default target when none is named
    fn run_targets(&self, matches: &ArgMatches, verbosity: Verbosity) -> anyhow::Result<()> {
        let tree = self.project.tree();
        let mut names: Vec<String> = matches
            .get_many::<String>("targets")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        if names.is_empty() {
            match tree.default_target() {
                Some(id) => names.push(tree.node(id).path.clone()),
                None => {
                    print_listing(&self.project);
                    return Ok(());
                }
            }
        }

        self.project
            .engine()
            .with_verbosity(verbosity)
            .run(&names)
            .with_context(|| format!("Failed to run {}", names.join(", ")))?;
        Ok(())
    }
}

/// Build the clap command from the loaded project
fn build_command(project: &Project) -> Command {
    let mut cmd = Command::new("grml")
        .version(env!("CARGO_PKG_VERSION"))
        .about(format!("Run commands of project '{}'", project.name()))
        .disable_help_subcommand(true)
        .arg(
            Arg::new("directory")
                .short('d')
                .long("directory")
                .value_name("DIR")
                .help("Root directory containing grml.yaml"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Echo every script line")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print script output and errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List commands and options without running anything")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("option")
                .short('o')
                .long("option")
                .value_name("NAME=VALUE")
                .help("Set an option for this run")
                .action(ArgAction::Append)
                .global(true),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .value_name("SHELL")
                .help("Print a shell completion script")
                .value_parser(value_parser!(Shell)),
        );

    let tree = project.tree();
    match tree.variant() {
        Variant::Commands => {
            for &id in tree.roots() {
                cmd = cmd.subcommand(node_command(tree, id));
            }
        }
        Variant::Targets => {
            cmd = cmd.arg(
                Arg::new("targets")
                    .value_name("TARGET")
                    .help("Targets to build")
                    .num_args(0..)
                    .action(ArgAction::Append),
            );
        }
    }

    cmd
}

/// Subcommand for a command node and, nested inside it, its children
fn node_command(tree: &NodeTree, id: NodeId) -> Command {
    let node = tree.node(id);
    let mut cmd = Command::new(node.name.clone())
        .about(node.help.clone())
        .visible_aliases(node.aliases.clone());

    for name in &node.args {
        cmd = cmd.arg(Arg::new(arg_id(name)).value_name(name.clone()).required(true));
    }

    if !node.children.is_empty() {
        cmd = cmd.subcommand_negates_reqs(true);
    }
    for &child in &node.children {
        cmd = cmd.subcommand(node_command(tree, child));
    }

    cmd
}

/// Follow the chain of matched subcommands down to the selected node
fn selected_command<'m>(tree: &NodeTree, matches: &'m ArgMatches) -> Option<(NodeId, &'m ArgMatches)> {
    let mut scope = tree.roots();
    let mut current = None;
    let mut matches = matches;

    while let Some((name, sub_matches)) = matches.subcommand() {
        let id = scope.iter().copied().find(|id| tree.node(*id).name == name)?;
        current = Some((id, sub_matches));
        scope = &tree.node(id).children;
        matches = sub_matches;
    }

    current
}

fn arg_id(name: &str) -> String {
    format!("{}{}", ARG_ID_PREFIX, name)
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    Verbosity::from_flags(matches.get_flag("quiet"), matches.get_flag("verbose"))
}

/// Run the CLI application with the process arguments
pub fn run() -> anyhow::Result<()> {
    run_from(std::env::args().collect())
}

/// Run the CLI application with provided arguments
pub fn run_from(args: Vec<String>) -> anyhow::Result<()> {
    // The command tree depends on the manifest, so the root is needed before clap runs.
    let root = match extract_directory_arg(&args) {
        Some(dir) => dir,
        None => find_root().context("Failed to locate grml.yaml")?,
    };

    App::new(root)?.run(args)
}

/// Extract --directory argument before clap parsing
///
/// Only the flags in front of the first command or target name are
/// scanned; anything after it belongs to the command line of that node.
pub fn extract_directory_arg(args: &[String]) -> Option<PathBuf> {
    let mut tokens = args.iter().skip(1);

    while let Some(arg) = tokens.next() {
        match arg.as_str() {
            "--" => return None,
            "-d" | "--directory" => return tokens.next().map(PathBuf::from),
            "-o" | "--option" | "--completions" => {
                tokens.next();
            }
            _ => {
                if let Some(dir) = arg.strip_prefix("--directory=") {
                    return Some(PathBuf::from(dir));
                }
                if let Some(dir) = arg.strip_prefix("-d").filter(|dir| !dir.is_empty()) {
                    return Some(PathBuf::from(dir));
                }
                if !arg.starts_with('-') {
                    return None;
                }
            }
        }
    }
    None
}
