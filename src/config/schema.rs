//! Manifest validation
//!
//! Structural checks that need no environment or tree: schema version,
//! project name, interpreter, node naming and default targets. Dependency
//! references are checked later, when the tree is linked.

use crate::config::types::{CommandDecl, Manifest, SCHEMA_VERSION};
use crate::error::{ManifestError, ManifestResult};

/// Validate a complete manifest
pub fn validate_manifest(manifest: &Manifest) -> ManifestResult<()> {
    if manifest.version != SCHEMA_VERSION {
        return Err(ManifestError::UnsupportedVersion {
            found: manifest.version,
            expected: SCHEMA_VERSION,
        });
    }

    if manifest.project.trim().is_empty() {
        return Err(ManifestError::MissingProject);
    }

    if manifest.commands.is_some() && manifest.targets.is_some() {
        return Err(ManifestError::Invalid(
            "a manifest declares either commands or targets, not both".to_string(),
        ));
    }

    manifest.interpreter()?;

    if let Some(commands) = &manifest.commands {
        validate_command_names(commands)?;
    }

    if let Some(targets) = &manifest.targets {
        for (name, _) in targets {
            validate_node_name(name)?;
        }

        let defaults: Vec<String> = targets
            .iter()
            .filter(|(_, target)| target.default)
            .map(|(name, _)| name.clone())
            .collect();
        if defaults.len() > 1 {
            return Err(ManifestError::MultipleDefaults(defaults));
        }
    }

    Ok(())
}

/// Check every name in a command tree without recursing
fn validate_command_names(commands: &[(String, CommandDecl)]) -> ManifestResult<()> {
    let mut pending: Vec<&[(String, CommandDecl)]> = vec![commands];

    while let Some(level) = pending.pop() {
        for (name, command) in level {
            validate_node_name(name)?;
            if !command.commands.is_empty() {
                pending.push(&command.commands);
            }
        }
    }

    Ok(())
}

/// A node name is one path segment: non-empty and free of `.`
pub fn validate_node_name(name: &str) -> ManifestResult<()> {
    if name.trim().is_empty() {
        return Err(ManifestError::Invalid("empty node name".to_string()));
    }
    if name.contains('.') {
        return Err(ManifestError::Invalid(format!(
            "node name '{}' must not contain '.'",
            name
        )));
    }
    Ok(())
}
