//! A loaded project
//!
//! [`Project`] owns everything derived from one manifest load: the parsed
//! manifest, the resolved environment, the options and the linked tree.
//! Reloading builds a fresh value and carries the option values over.

use crate::config::{manifest_path, parse_manifest_file, Interpreter, Manifest};
use crate::error::{ManifestError, Result};
use crate::runner::{Engine, Environment, NodeTree, OptionStore};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::thread;

#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    inherited: BTreeMap<String, String>,
    manifest: Manifest,
    interpreter: Interpreter,
    env: Environment,
    options: OptionStore,
    tree: NodeTree,
}

impl Project {
    /// Load the manifest in `root`, inheriting this process's environment
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_env(root, env::vars().collect())
    }

    /// Load the manifest in `root` on top of an explicit base environment
    pub fn load_with_env(root: impl AsRef<Path>, inherited: BTreeMap<String, String>) -> Result<Self> {
        let root = root.as_ref();
        let root = dunce::canonicalize(root)
            .map_err(|_| ManifestError::NotFound(manifest_path(root)))?;

        let path = manifest_path(&root);
        log::debug!("loading {}", path.display());
        let manifest = parse_manifest_file(&path)?;

        let interpreter = manifest.interpreter()?;
        let options = OptionStore::from_decls(&manifest.options)?;
        let env = Environment::resolve(&inherited, &synthesized(&root, &manifest), &manifest.env);
        let tree = NodeTree::build(&manifest, &env)?;

        Ok(Project {
            root,
            inherited,
            manifest,
            interpreter,
            env,
            options,
            tree,
        })
    }

    /// Load the manifest again, keeping the current option values where possible
    pub fn reload(&self) -> Result<Self> {
        let mut project = Self::load_with_env(&self.root, self.inherited.clone())?;
        project.options.restore(&self.options);
        Ok(project)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn name(&self) -> &str {
        &self.manifest.project
    }

    pub fn interpreter(&self) -> Interpreter {
        self.interpreter
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn options(&self) -> &OptionStore {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut OptionStore {
        &mut self.options
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// Engine running this project's nodes with its current options
    pub fn engine(&self) -> Engine<'_> {
        Engine::new(&self.tree, &self.env, &self.options, &self.root)
            .with_interpreter(self.interpreter)
            .with_imports(&self.manifest.import)
    }
}

/// Values grml provides to every manifest
fn synthesized(root: &Path, manifest: &Manifest) -> BTreeMap<String, String> {
    let root = root.display().to_string();
    let cpus = thread::available_parallelism().map_or(1, |n| n.get());

    let mut vars = BTreeMap::new();
    vars.insert("ROOT".to_string(), root.clone());
    vars.insert("PWD".to_string(), root);
    vars.insert("PROJECT".to_string(), manifest.project.clone());
    vars.insert("NUMCPU".to_string(), cpus.to_string());
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GrmlError;
    use crate::runner::OptionValue;
    use std::fs;
    use tempfile::TempDir;

    fn project_dir(yaml: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("grml.yaml"), yaml).unwrap();
        dir
    }

    #[test]
    fn test_load_synthesizes_values() {
        let dir = project_dir("version: 1\nproject: demo\nenv:\n  OUT: ${ROOT}/out\n");
        let project = Project::load_with_env(dir.path(), BTreeMap::new()).unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap().display().to_string();

        assert_eq!(project.name(), "demo");
        assert_eq!(project.env().get("ROOT"), Some(root.as_str()));
        assert_eq!(project.env().get("PWD"), Some(root.as_str()));
        assert_eq!(project.env().get("PROJECT"), Some("demo"));
        assert!(project.env().get("NUMCPU").unwrap().parse::<usize>().unwrap() >= 1);
        assert_eq!(project.env().get("OUT"), Some(format!("{}/out", root).as_str()));
    }

    #[test]
    fn test_missing_manifest() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Project::load(dir.path()),
            Err(GrmlError::Manifest(ManifestError::NotFound(_)))
        ));
    }

    #[test]
    fn test_reload_restores_options() {
        let dir = project_dir("version: 1\nproject: demo\noptions:\n  DEBUG: false\n  MODE: [a, b]\n");
        let mut project = Project::load(dir.path()).unwrap();
        project.options_mut().toggle("DEBUG").unwrap();
        project.options_mut().set_choice("MODE", "b").unwrap();

        fs::write(
            dir.path().join("grml.yaml"),
            "version: 1\nproject: renamed\noptions:\n  DEBUG: false\n  MODE: [b, c]\n",
        )
        .unwrap();

        let reloaded = project.reload().unwrap();
        assert_eq!(reloaded.name(), "renamed");
        assert_eq!(reloaded.options().get("DEBUG"), Some(&OptionValue::Bool(true)));
        assert_eq!(reloaded.options().get("MODE").unwrap().env_value(), "b");
    }

    #[test]
    fn test_reload_failure_keeps_previous() {
        let dir = project_dir("version: 1\nproject: demo\n");
        let project = Project::load(dir.path()).unwrap();
        fs::write(dir.path().join("grml.yaml"), "version: 2\nproject: demo\n").unwrap();

        assert!(project.reload().is_err());
        assert_eq!(project.name(), "demo");
    }
}
