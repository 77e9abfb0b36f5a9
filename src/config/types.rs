//! Core manifest types
//!
//! This module defines the data structures that represent a grml.yaml manifest.
//! Mappings are read into ordered lists so that declaration order survives
//! deserialization.

use crate::error::{ManifestError, ManifestResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;

/// Manifest schema version supported by this build
pub const SCHEMA_VERSION: i64 = 1;

/// Top-level manifest structure
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Schema version, must equal [`SCHEMA_VERSION`]
    #[serde(default)]
    pub version: i64,

    /// Project name
    #[serde(default)]
    pub project: String,

    /// Environment declarations in declaration order
    #[serde(default, deserialize_with = "deserialize_env")]
    pub env: Vec<EnvEntry>,

    /// Raw option declarations (boolean or list of choices)
    #[serde(default, deserialize_with = "deserialize_ordered")]
    pub options: Vec<(String, Value)>,

    /// Shell used to run scripts (`sh` or `bash`)
    #[serde(default)]
    pub interpreter: Option<String>,

    /// Scripts sourced before every script body, relative to the root
    #[serde(default)]
    pub import: Vec<String>,

    /// Command tree (memoized variant)
    #[serde(default, deserialize_with = "deserialize_optional_ordered")]
    pub commands: Option<Vec<(String, CommandDecl)>>,

    /// Targets (output-tracking variant)
    #[serde(default, deserialize_with = "deserialize_optional_ordered")]
    pub targets: Option<Vec<(String, TargetDecl)>>,
}

impl Manifest {
    /// Parse the configured interpreter, defaulting to `sh`
    pub fn interpreter(&self) -> ManifestResult<Interpreter> {
        match &self.interpreter {
            Some(name) => name.parse(),
            None => Ok(Interpreter::default()),
        }
    }
}

/// A single `KEY: value` environment declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
}

impl EnvEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        EnvEntry {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A command declaration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandDecl {
    /// Alternative names
    #[serde(default, alias = "alias")]
    pub aliases: Vec<String>,

    /// Help text, may contain `${VAR}` placeholders
    #[serde(default)]
    pub help: String,

    /// Positional argument names
    #[serde(default)]
    pub args: Vec<String>,

    /// Dependency references (absolute or `.`-relative paths)
    #[serde(default)]
    pub deps: Vec<String>,

    /// Script body
    #[serde(default)]
    pub exec: String,

    /// Nested sub commands
    #[serde(default, deserialize_with = "deserialize_ordered")]
    pub commands: Vec<(String, CommandDecl)>,
}

/// A target declaration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDecl {
    /// Help text, may contain `${VAR}` placeholders
    #[serde(default)]
    pub help: String,

    /// Group heading used when listing targets
    #[serde(rename = "help-group", default)]
    pub help_group: Option<String>,

    /// Script body
    #[serde(default)]
    pub run: String,

    /// Run this target when none is requested
    #[serde(default)]
    pub default: bool,

    /// Dependency references (target names or outputs of other targets)
    #[serde(default)]
    pub deps: Vec<String>,

    /// Files produced by the script, relative to the root
    #[serde(default, alias = "outputs", deserialize_with = "deserialize_string_list")]
    pub output: Vec<String>,
}

/// Supported script interpreters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpreter {
    #[default]
    Sh,
    Bash,
}

impl Interpreter {
    /// Program name passed to the OS
    pub fn program(&self) -> &'static str {
        match self {
            Interpreter::Sh => "sh",
            Interpreter::Bash => "bash",
        }
    }
}

impl FromStr for Interpreter {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sh" => Ok(Interpreter::Sh),
            "bash" => Ok(Interpreter::Bash),
            other => Err(ManifestError::UnsupportedInterpreter(other.to_string())),
        }
    }
}

impl fmt::Display for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Render a scalar YAML value as text; `None` for sequences and mappings
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Deserialize a mapping, or a list of single-key mappings, into ordered pairs
fn deserialize_ordered<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    let mut entries = Vec::new();

    match value {
        Value::Null => {}
        Value::Mapping(map) => {
            for (key, item) in map {
                entries.push(ordered_entry(key, item).map_err(D::Error::custom)?);
            }
        }
        Value::Sequence(seq) => {
            for element in seq {
                match element {
                    Value::Mapping(map) if map.len() == 1 => {
                        for (key, item) in map {
                            entries.push(ordered_entry(key, item).map_err(D::Error::custom)?);
                        }
                    }
                    _ => {
                        return Err(D::Error::custom(
                            "list entries must be single-key mappings",
                        ))
                    }
                }
            }
        }
        _ => {
            return Err(D::Error::custom(
                "expected a mapping or a list of single-key mappings",
            ))
        }
    }

    Ok(entries)
}

fn deserialize_optional_ordered<'de, D, T>(
    deserializer: D,
) -> Result<Option<Vec<(String, T)>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: DeserializeOwned,
{
    deserialize_ordered(deserializer).map(Some)
}

fn ordered_entry<T: DeserializeOwned>(key: Value, item: Value) -> Result<(String, T), String> {
    let key = match scalar_to_string(&key) {
        Some(key) => key,
        None => return Err("mapping keys must be scalars".to_string()),
    };
    // A bare `name:` declares an entry with every field defaulted.
    let parsed = match serde_yaml::from_value(item.clone()) {
        Err(_) if item.is_null() => serde_yaml::from_value(Value::Mapping(Default::default())),
        other => other,
    };
    let item = parsed.map_err(|e| format!("'{}': {}", key, e))?;
    Ok((key, item))
}

fn deserialize_env<'de, D>(deserializer: D) -> Result<Vec<EnvEntry>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let entries: Vec<(String, Value)> = deserialize_ordered(deserializer)?;
    entries
        .into_iter()
        .map(|(key, value)| match scalar_to_string(&value) {
            Some(value) => Ok(EnvEntry { key, value }),
            None => Err(D::Error::custom(format!(
                "env '{}': value must be a scalar",
                key
            ))),
        })
        .collect()
}

/// Custom deserializer for fields that accept a single string or a list
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::String(s) => Ok(vec![s]),
        Value::Sequence(seq) => seq
            .iter()
            .map(|item| {
                scalar_to_string(item).ok_or_else(|| D::Error::custom("expected a list of strings"))
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("expected a string or a list of strings")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_simple_manifest() {
        let yaml = r#"
version: 1
project: demo
commands:
  hello:
    help: Say hello
    exec: echo "hello"
"#;
        let manifest: Manifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(manifest.project, "demo");
        let commands = manifest.commands.unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].0, "hello");
        assert_eq!(commands[0].1.exec, "echo \"hello\"");
    }

    #[test]
    fn test_mapping_order_is_preserved() {
        let yaml = r#"
version: 1
project: demo
env:
  ZETA: z
  ALPHA: a
  MID: m
commands:
  zz: {}
  aa: {}
  mm:
    commands:
      second: {}
      first: {}
"#;
        let manifest: Manifest = serde_yaml::from_str(yaml).unwrap();
        let keys: Vec<_> = manifest.env.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["ZETA", "ALPHA", "MID"]);

        let commands = manifest.commands.unwrap();
        let names: Vec<_> = commands.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zz", "aa", "mm"]);
        let nested: Vec<_> = commands[2].1.commands.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(nested, vec!["second", "first"]);
    }

    #[test]
    fn test_env_list_form_and_scalars() {
        let yaml = r#"
version: 1
project: demo
env:
  - ROOT: /should-not-win
  - JOBS: 4
  - DEBUG: true
"#;
        let manifest: Manifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            manifest.env,
            vec![
                EnvEntry::new("ROOT", "/should-not-win"),
                EnvEntry::new("JOBS", "4"),
                EnvEntry::new("DEBUG", "true"),
            ]
        );
    }

    #[test]
    fn test_target_output_accepts_string() {
        let yaml = r#"
version: 1
project: demo
targets:
  build:
    run: touch out.txt
    output: out.txt
    default: true
    help-group: Build
"#;
        let manifest: Manifest = serde_yaml::from_str(yaml).unwrap();
        let targets = manifest.targets.unwrap();
        let build = &targets[0].1;
        assert_eq!(build.output, vec!["out.txt"]);
        assert!(build.default);
        assert_eq!(build.help_group.as_deref(), Some("Build"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
version: 1
project: demo
commands:
  hello:
    exec: echo hi
    bogus: 1
"#;
        let result: Result<Manifest, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_alias_key_accepted() {
        let yaml = r#"
version: 1
project: demo
commands:
  build:
    alias: [b]
"#;
        let manifest: Manifest = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(manifest.commands.unwrap()[0].1.aliases, vec!["b"]);
    }

    #[test]
    fn test_bare_entry_uses_defaults() {
        let manifest: Manifest =
            serde_yaml::from_str("version: 1\nproject: demo\ncommands:\n  clean:\n").unwrap();
        let commands = manifest.commands.unwrap();
        assert_eq!(commands[0].0, "clean");
        assert!(commands[0].1.exec.is_empty());
    }

    #[test]
    fn test_interpreter_parsing() {
        assert_eq!("sh".parse::<Interpreter>().unwrap(), Interpreter::Sh);
        assert_eq!("bash".parse::<Interpreter>().unwrap(), Interpreter::Bash);
        assert!(matches!(
            "zsh".parse::<Interpreter>(),
            Err(ManifestError::UnsupportedInterpreter(_))
        ));
    }
}
