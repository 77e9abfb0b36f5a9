//! Manifest file discovery and parsing

use crate::config::schema::validate_manifest;
use crate::config::types::Manifest;
use crate::error::{GrmlError, ManifestError, ManifestResult};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest file name looked up in the root directory
pub const MANIFEST_FILE_NAME: &str = "grml.yaml";

/// Find the root directory by searching the current and parent directories
pub fn find_root() -> ManifestResult<PathBuf> {
    let current = env::current_dir().map_err(|e| {
        ManifestError::Invalid(format!("Failed to get current directory: {}", e))
    })?;
    find_root_from(current)
}

/// Find the nearest directory, starting at `start_dir`, that contains a manifest
pub fn find_root_from(start_dir: PathBuf) -> ManifestResult<PathBuf> {
    let mut current_dir = start_dir.clone();

    loop {
        if current_dir.join(MANIFEST_FILE_NAME).is_file() {
            return Ok(current_dir);
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ManifestError::NotFound(start_dir.join(MANIFEST_FILE_NAME))),
        }
    }
}

/// Path of the manifest inside a root directory
pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE_NAME)
}

/// Parse and validate a manifest file
pub fn parse_manifest_file(path: &Path) -> Result<Manifest, GrmlError> {
    if !path.is_file() {
        return Err(ManifestError::NotFound(path.to_path_buf()).into());
    }

    let contents = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_manifest(&contents)
}

/// Parse and validate a manifest from a string
pub fn parse_manifest(yaml: &str) -> Result<Manifest, GrmlError> {
    let manifest: Manifest = serde_yaml::from_str(yaml)?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}
