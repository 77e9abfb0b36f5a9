//! Listing of nodes and options

use crate::project::Project;
use crate::runner::{NodeId, NodeTree, OptionStore, OptionValue, Variant};
use colored::Colorize;
use std::fmt;

/// Print the nodes and current options of a project to stdout
pub fn print_listing(project: &Project) {
    print!("{}", Listing(project));
}

/// Displays the nodes and current options of a project
pub struct Listing<'a>(pub &'a Project);

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let project = self.0;
        writeln!(f, "{} {}", "Project:".bold(), project.name())?;

        let tree = project.tree();
        match tree.variant() {
            Variant::Commands => write_commands(f, tree)?,
            Variant::Targets => write_targets(f, tree)?,
        }

        if !project.options().is_empty() {
            writeln!(f)?;
            write_options(f, project.options())?;
        }
        Ok(())
    }
}

fn write_commands(f: &mut fmt::Formatter<'_>, tree: &NodeTree) -> fmt::Result {
    writeln!(f, "\n{}", "Commands:".bold())?;
    if tree.is_empty() {
        return writeln!(f, "  (none)");
    }

    let mut stack: Vec<(NodeId, usize)> = tree.roots().iter().rev().map(|id| (*id, 1)).collect();
    while let Some((id, depth)) = stack.pop() {
        let node = tree.node(id);
        write!(f, "{}{}", "  ".repeat(depth), node.name.green())?;
        if !node.aliases.is_empty() {
            write!(f, " ({})", node.aliases.join(", "))?;
        }
        for arg in &node.args {
            write!(f, " <{}>", arg)?;
        }
        if !node.help.is_empty() {
            write!(f, "  {}", node.help.dimmed())?;
        }
        writeln!(f)?;

        stack.extend(node.children.iter().rev().map(|child| (*child, depth + 1)));
    }
    Ok(())
}

fn write_targets(f: &mut fmt::Formatter<'_>, tree: &NodeTree) -> fmt::Result {
    // Ungrouped targets first, then groups in order of first appearance.
    let mut groups: Vec<Option<&str>> = vec![None];
    for &id in tree.roots() {
        let group = tree.node(id).help_group.as_deref();
        if !groups.contains(&group) {
            groups.push(group);
        }
    }

    for group in groups {
        let members: Vec<NodeId> = tree
            .roots()
            .iter()
            .copied()
            .filter(|id| tree.node(*id).help_group.as_deref() == group)
            .collect();
        if members.is_empty() && group.is_some() {
            continue;
        }

        let heading = group.unwrap_or("Targets");
        writeln!(f, "\n{}", format!("{}:", heading).bold())?;
        if members.is_empty() {
            writeln!(f, "  (none)")?;
        }

        for id in members {
            let node = tree.node(id);
            write!(f, "  {}", node.name.green())?;
            if node.default {
                write!(f, " {}", "(default)".yellow())?;
            }
            if !node.help.is_empty() {
                write!(f, "  {}", node.help.dimmed())?;
            }
            writeln!(f)?;
        }
    }
    Ok(())
}

fn write_options(f: &mut fmt::Formatter<'_>, options: &OptionStore) -> fmt::Result {
    writeln!(f, "{}", "Options:".bold())?;
    for (name, value) in options.iter() {
        match value {
            OptionValue::Bool(b) => writeln!(f, "  {} = {}", name.cyan(), b)?,
            OptionValue::Choice(choice) => writeln!(
                f,
                "  {} = {} [{}]",
                name.cyan(),
                choice.active(),
                choice.allowed().join(", ")
            )?,
        }
    }
    Ok(())
}
