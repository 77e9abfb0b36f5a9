//! Node tree construction and dependency linking
//!
//! The tree is a flat arena of nodes addressed by [`NodeId`]. It is built in
//! two phases: every manifest entry is turned into a node first, and only
//! then are the raw dependency references resolved into node ids. This lets
//! a node depend on anything declared later in the document.

use crate::config::{CommandDecl, Manifest, TargetDecl};
use crate::error::{ManifestError, ManifestResult};
use crate::runner::Environment;
use std::path::{Component, Path, PathBuf};

/// Stable identity of a node inside its [`NodeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index)
    }
}

/// Which kind of nodes a manifest declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Nested commands, each run at most once per invocation
    Commands,
    /// Flat targets with outputs, rerun only when stale
    Targets,
}

/// A command or target
#[derive(Debug, Clone)]
pub struct Node {
    /// Name, unique among siblings
    pub name: String,

    /// Dot-joined names from the root to this node
    pub path: String,

    pub aliases: Vec<String>,

    /// Help text with `${VAR}` placeholders already evaluated
    pub help: String,

    pub help_group: Option<String>,

    /// Declared positional argument names
    pub args: Vec<String>,

    /// Script body
    pub script: String,

    /// Dependency references as written in the manifest
    pub dep_refs: Vec<String>,

    /// Resolved dependencies, in declaration order
    pub deps: Vec<NodeId>,

    /// Declared outputs, relative to the root
    pub outputs: Vec<PathBuf>,

    pub default: bool,

    pub children: Vec<NodeId>,
}

impl Node {
    fn new(name: &str, path: String) -> Self {
        Node {
            name: name.to_string(),
            path,
            aliases: Vec::new(),
            help: String::new(),
            help_group: None,
            args: Vec::new(),
            script: String::new(),
            dep_refs: Vec::new(),
            deps: Vec::new(),
            outputs: Vec::new(),
            default: false,
            children: Vec::new(),
        }
    }

    /// True if `name` is this node's name or one of its aliases
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    pub fn has_script(&self) -> bool {
        !self.script.trim().is_empty()
    }
}

/// Arena holding every node of a manifest
#[derive(Debug, Clone)]
pub struct NodeTree {
    variant: Variant,
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl NodeTree {
    /// Build all nodes, then link their dependencies
    pub fn build(manifest: &Manifest, env: &Environment) -> ManifestResult<Self> {
        let mut tree = match &manifest.targets {
            Some(targets) => Self::from_targets(targets, env)?,
            None => Self::from_commands(manifest.commands.as_deref().unwrap_or_default(), env)?,
        };
        tree.link(env)?;

        log::debug!(
            "built {} node(s), {} at the top level",
            tree.nodes.len(),
            tree.roots.len()
        );
        Ok(tree)
    }

    fn empty(variant: Variant) -> Self {
        NodeTree {
            variant,
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    fn from_commands(commands: &[(String, CommandDecl)], env: &Environment) -> ManifestResult<Self> {
        let mut tree = Self::empty(Variant::Commands);

        // Reversed so that popping visits declarations in document order.
        let mut pending: Vec<(Option<NodeId>, &str, &CommandDecl)> = commands
            .iter()
            .rev()
            .map(|(name, decl)| (None, name.as_str(), decl))
            .collect();

        while let Some((parent, name, decl)) = pending.pop() {
            let path = match parent {
                Some(p) => format!("{}.{}", tree.nodes[p.0].path, name),
                None => name.to_string(),
            };

            let mut node = Node::new(name, path);
            node.aliases = decl.aliases.clone();
            node.help = env.substitute(&decl.help);
            node.args = decl.args.clone();
            node.script = decl.exec.clone();
            node.dep_refs = decl.deps.clone();

            let id = tree.insert(parent, node)?;
            pending.extend(
                decl.commands
                    .iter()
                    .rev()
                    .map(|(name, decl)| (Some(id), name.as_str(), decl)),
            );
        }

        Ok(tree)
    }

    fn from_targets(targets: &[(String, TargetDecl)], env: &Environment) -> ManifestResult<Self> {
        let mut tree = Self::empty(Variant::Targets);

        for (name, decl) in targets {
            let mut node = Node::new(name, name.clone());
            node.help = env.substitute(&decl.help);
            node.help_group = decl.help_group.clone();
            node.script = decl.run.clone();
            node.dep_refs = decl.deps.clone();
            node.outputs = decl
                .output
                .iter()
                .map(|output| clean_path(&env.substitute(output)))
                .collect();
            node.default = decl.default;

            tree.insert(None, node)?;
        }

        Ok(tree)
    }

    fn insert(&mut self, parent: Option<NodeId>, node: Node) -> ManifestResult<NodeId> {
        let siblings = match parent {
            Some(p) => &self.nodes[p.0].children,
            None => &self.roots,
        };

        // A name or alias may address exactly one sibling.
        let mut claimed = vec![node.name.as_str()];
        for alias in &node.aliases {
            if claimed.contains(&alias.as_str()) {
                return Err(ManifestError::DuplicateNode(node.path));
            }
            claimed.push(alias);
        }
        let collides = siblings.iter().any(|id| {
            let sibling = &self.nodes[id.0];
            claimed.iter().any(|name| sibling.answers_to(name))
        });
        if collides {
            return Err(ManifestError::DuplicateNode(node.path));
        }

        let id = NodeId(self.nodes.len());
        log::trace!("node {}: {}", id.0, node.path);
        self.nodes.push(node);
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        Ok(id)
    }

    /// Second phase: resolve every raw dependency reference
    fn link(&mut self, env: &Environment) -> ManifestResult<()> {
        for index in 0..self.nodes.len() {
            let mut deps = Vec::with_capacity(self.nodes[index].dep_refs.len());
            for raw in &self.nodes[index].dep_refs {
                let dep = self.resolve_reference(NodeId(index), &env.substitute(raw))?;
                log::trace!(
                    "{} depends on {}",
                    self.nodes[index].path,
                    self.nodes[dep.0].path
                );
                deps.push(dep);
            }
            self.nodes[index].deps = deps;
        }
        Ok(())
    }

    fn resolve_reference(&self, from: NodeId, reference: &str) -> ManifestResult<NodeId> {
        let node = &self.nodes[from.0];

        if reference.trim().is_empty() {
            return Err(ManifestError::EmptyDependency {
                node: node.path.clone(),
            });
        }

        let found = match reference.strip_prefix('.') {
            Some(relative) => self.lookup(&node.children, relative, false),
            None => self.lookup(&self.roots, reference, false),
        };
        if let Some(id) = found {
            return Ok(id);
        }

        // Targets may also name a file another target produces.
        if self.variant == Variant::Targets {
            let wanted = clean_path(reference);
            if let Some(index) = self.nodes.iter().position(|n| n.outputs.contains(&wanted)) {
                return Ok(NodeId(index));
            }
        }

        Err(ManifestError::UnresolvedDependency {
            node: node.path.clone(),
            dependency: reference.to_string(),
        })
    }

    /// Walk a dotted path segment by segment through `scope`
    fn lookup(&self, scope: &[NodeId], path: &str, aliases: bool) -> Option<NodeId> {
        let mut scope = scope;
        let mut current = None;

        for segment in path.split('.') {
            let by_name = scope.iter().copied().find(|id| self.nodes[id.0].name == segment);
            let id = match by_name {
                Some(id) => id,
                None if aliases => scope
                    .iter()
                    .copied()
                    .find(|id| self.nodes[id.0].answers_to(segment))?,
                None => return None,
            };
            current = Some(id);
            scope = &self.nodes[id.0].children;
        }

        current
    }

    /// Find a node by absolute dotted path; aliases are accepted per segment
    pub fn find(&self, path: &str) -> Option<NodeId> {
        if path.is_empty() {
            return None;
        }
        self.lookup(&self.roots, path, true)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in build order (parents before their children)
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn default_target(&self) -> Option<NodeId> {
        self.roots
            .iter()
            .copied()
            .find(|id| self.nodes[id.0].default)
    }
}

/// Lexically normalize a relative or absolute path
fn clean_path(raw: &str) -> PathBuf {
    let mut cleaned = PathBuf::new();

    for component in Path::new(raw).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => cleaned.push(".."),
            },
            other => cleaned.push(other.as_os_str()),
        }
    }

    if cleaned.as_os_str().is_empty() {
        cleaned.push(".");
    }
    cleaned
}
