//! Integration tests for manifest parsing and loading

mod common;

use common::{create_project, create_project_with_subdir};
use grml::config::{find_root_from, parse_manifest, parse_manifest_file, Interpreter};
use grml::error::{GrmlError, ManifestError};
use grml::runner::{OptionValue, Variant};
use grml::Project;

#[test]
fn test_parse_complete_manifest() {
    let yaml = r#"
version: 1
project: my-app
interpreter: bash
import:
  - scripts/common.sh
env:
  OUT: ${ROOT}/out
  BIN: ${OUT}/bin
options:
  RELEASE: false
  ARCH: [amd64, arm64]
commands:
  build:
    help: Build ${PROJECT}
    alias: [b]
    exec: make
    commands:
      docs:
        deps: [build]
        exec: make docs
  test:
    deps: [build]
    exec: make test
"#;

    let manifest = parse_manifest(yaml).unwrap();

    assert_eq!(manifest.project, "my-app");
    assert_eq!(manifest.interpreter().unwrap(), Interpreter::Bash);
    assert_eq!(manifest.import, vec!["scripts/common.sh"]);

    let env: Vec<_> = manifest.env.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(env, vec!["OUT", "BIN"]);

    let commands = manifest.commands.as_ref().unwrap();
    assert_eq!(commands.len(), 2);
    let (name, build) = &commands[0];
    assert_eq!(name, "build");
    assert_eq!(build.aliases, vec!["b"]);
    assert_eq!(build.commands[0].0, "docs");
}

#[test]
fn test_parse_targets_manifest() {
    let yaml = r#"
version: 1
project: site
targets:
  html:
    help: Render pages
    help-group: Build
    run: ./render.sh
    deps: [css]
    output: [public/index.html]
    default: true
  css:
    run: sass style.scss public/style.css
    output: public/style.css
"#;

    let manifest = parse_manifest(yaml).unwrap();
    let targets = manifest.targets.as_ref().unwrap();
    assert_eq!(targets[0].1.help_group.as_deref(), Some("Build"));
    assert!(targets[0].1.default);
    assert_eq!(targets[1].1.output, vec!["public/style.css"]);
}

#[test]
fn test_parse_from_file() {
    let (_dir, path) = create_project("version: 1\nproject: demo\n");
    let manifest = parse_manifest_file(&path).unwrap();
    assert_eq!(manifest.project, "demo");
}

#[test]
fn test_root_found_from_subdirectory() {
    let (dir, sub_dir) = create_project_with_subdir("version: 1\nproject: demo\n");
    assert_eq!(find_root_from(sub_dir).unwrap(), dir.path());
}

#[test]
fn test_invalid_manifest_wrong_version() {
    let result = parse_manifest("version: 3\nproject: demo\n");
    assert!(matches!(
        result,
        Err(GrmlError::Manifest(ManifestError::UnsupportedVersion { found: 3, expected: 1 }))
    ));
}

#[test]
fn test_invalid_manifest_unknown_key() {
    let result = parse_manifest("version: 1\nproject: demo\ntasks: {}\n");
    assert!(matches!(result, Err(GrmlError::Yaml(_))));
}

#[test]
fn test_load_builds_tree_and_options() {
    let (dir, _) = create_project(
        r#"
version: 1
project: demo
options:
  VERBOSE: true
  LEVEL: [1, 2, 3]
commands:
  build:
    commands:
      linux: {}
  test:
    deps: [build.linux]
"#,
    );
    let project = Project::load(dir.path()).unwrap();

    let tree = project.tree();
    assert_eq!(tree.variant(), Variant::Commands);
    assert_eq!(tree.len(), 3);
    let test = tree.node(tree.find("test").unwrap());
    assert_eq!(test.deps, vec![tree.find("build.linux").unwrap()]);

    assert_eq!(project.options().get("VERBOSE"), Some(&OptionValue::Bool(true)));
    assert_eq!(project.options().get("LEVEL").unwrap().env_value(), "1");
}

#[test]
fn test_load_duplicate_option() {
    let (dir, _) = create_project(
        r#"
version: 1
project: demo
options:
  - DEBUG: true
  - DEBUG: false
"#,
    );
    assert!(matches!(
        Project::load(dir.path()),
        Err(GrmlError::Manifest(ManifestError::DuplicateOption(name))) if name == "DEBUG"
    ));
}

#[test]
fn test_load_unresolved_dependency() {
    let (dir, _) = create_project(
        r#"
version: 1
project: demo
commands:
  test:
    deps: [build]
"#,
    );
    let err = Project::load(dir.path()).unwrap_err();
    assert!(err.to_string().contains("unresolved dependency 'build'"));
}

#[test]
fn test_load_alias_shadowing_sibling() {
    let (dir, _) = create_project(
        r#"
version: 1
project: demo
commands:
  a:
    aliases: [b]
    exec: echo a >> log
  b:
    exec: echo b >> log
"#,
    );
    assert!(matches!(
        Project::load(dir.path()),
        Err(GrmlError::Manifest(ManifestError::DuplicateNode(path))) if path == "b"
    ));
}

#[test]
fn test_load_unsupported_interpreter() {
    let (dir, _) = create_project("version: 1\nproject: demo\ninterpreter: fish\n");
    assert!(matches!(
        Project::load(dir.path()),
        Err(GrmlError::Manifest(ManifestError::UnsupportedInterpreter(name))) if name == "fish"
    ));
}

#[test]
fn test_empty_manifest_has_no_nodes() {
    let (dir, _) = create_project("version: 1\nproject: demo\n");
    let project = Project::load(dir.path()).unwrap();
    assert!(project.tree().is_empty());
    assert_eq!(project.tree().variant(), Variant::Commands);
}
