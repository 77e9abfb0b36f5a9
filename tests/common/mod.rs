//! Common test utilities

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a temporary project directory with a grml.yaml file
pub fn create_project(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let manifest_path = temp_dir.path().join("grml.yaml");
    fs::write(&manifest_path, content).unwrap();
    (temp_dir, manifest_path)
}

/// Create a project and a subdirectory inside it
pub fn create_project_with_subdir(content: &str) -> (TempDir, PathBuf) {
    let (temp_dir, _) = create_project(content);
    let sub_dir = temp_dir.path().join("subdir");
    fs::create_dir(&sub_dir).unwrap();
    (temp_dir, sub_dir)
}

/// Lines appended to `log` in the project root by test scripts
pub fn read_log(root: &Path) -> Vec<String> {
    fs::read_to_string(root.join("log"))
        .unwrap_or_default()
        .lines()
        .map(String::from)
        .collect()
}
