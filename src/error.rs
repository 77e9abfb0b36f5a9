//! Error types for grml

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for grml operations
pub type Result<T> = std::result::Result<T, GrmlError>;

/// Main error type for grml
#[derive(Error, Debug)]
pub enum GrmlError {
    /// Manifest loading, validation and linking errors
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Errors while ordering the requested nodes
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Option lookup and mutation errors
    #[error("Option error: {0}")]
    Option(#[from] OptionError),

    /// Node execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Manifest parsing, validation and dependency linking errors
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid manifest: {0}")]
    Invalid(String),

    #[error("Incompatible manifest version: file={found} current={expected}")]
    UnsupportedVersion { found: i64, expected: i64 },

    #[error("No project name set")]
    MissingProject,

    #[error("Duplicate option: {0}")]
    DuplicateOption(String),

    #[error("Invalid option '{name}': {reason}")]
    InvalidOption { name: String, reason: String },

    #[error("Duplicate node '{0}'")]
    DuplicateNode(String),

    #[error("Node '{node}': empty dependency value")]
    EmptyDependency { node: String },

    #[error("Node '{node}': unresolved dependency '{dependency}'")]
    UnresolvedDependency { node: String, dependency: String },

    #[error("Unsupported interpreter: {0} (expected 'sh' or 'bash')")]
    UnsupportedInterpreter(String),

    #[error("Multiple default targets: {}", .0.join(", "))]
    MultipleDefaults(Vec<String>),
}

/// Errors raised while computing an execution order
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Target '{0}' does not exist")]
    UnknownTarget(String),

    #[error("Cyclic dependency detected: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),
}

/// Option lookup and mutation errors
#[derive(Error, Debug)]
pub enum OptionError {
    #[error("Option '{0}' does not exist")]
    Unknown(String),

    #[error("Option '{0}' is not a boolean option")]
    NotBoolean(String),

    #[error("Option '{0}' is not a choice option")]
    NotChoice(String),

    #[error("Invalid value '{value}' for option '{name}' (allowed: {})", allowed.join(", "))]
    InvalidChoice {
        name: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("Invalid option assignment '{0}' (expected NAME=VALUE)")]
    InvalidAssignment(String),
}

/// Node execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("'{path}' failed with exit code {code}")]
    Failed { path: String, code: i32 },

    #[error("'{path}' was terminated by a signal")]
    Terminated { path: String },

    #[error("'{path}': failed to spawn '{interpreter}': {source}")]
    Spawn {
        path: String,
        interpreter: String,
        #[source]
        source: io::Error,
    },

    #[error("'{path}': failed to check output '{}': {source}", output.display())]
    Output {
        path: String,
        output: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExecutionError {
    /// Path of the node the error belongs to
    pub fn node_path(&self) -> &str {
        match self {
            ExecutionError::Failed { path, .. }
            | ExecutionError::Terminated { path }
            | ExecutionError::Spawn { path, .. }
            | ExecutionError::Output { path, .. } => path,
        }
    }
}

/// Specialized result type for manifest operations
pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

/// Specialized result type for scheduling
pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;

/// Specialized result type for option operations
pub type OptionResult<T> = std::result::Result<T, OptionError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;
