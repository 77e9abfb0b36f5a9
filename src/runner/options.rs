//! Boolean and choice options
//!
//! Options are declared once in the manifest and exported to every script
//! as environment variables named after the option.

use crate::config::scalar_to_string;
use crate::error::{ManifestError, ManifestResult, OptionError, OptionResult};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// A choice option: an ordered list of allowed values and the active one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    active: String,
    allowed: Vec<String>,
}

impl Choice {
    /// Create a choice whose active value is the first allowed value
    pub fn new(allowed: Vec<String>) -> Option<Self> {
        let active = allowed.first()?.clone();
        Some(Choice { active, allowed })
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn contains(&self, value: &str) -> bool {
        self.allowed.iter().any(|v| v == value)
    }
}

/// The value of a single option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Choice(Choice),
}

impl OptionValue {
    /// Value exported to the script environment
    pub fn env_value(&self) -> String {
        match self {
            OptionValue::Bool(b) => b.to_string(),
            OptionValue::Choice(choice) => choice.active.clone(),
        }
    }
}

/// All options of a loaded manifest, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionStore {
    options: BTreeMap<String, OptionValue>,
}

impl OptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the store from the raw manifest declarations
    pub fn from_decls(decls: &[(String, Value)]) -> ManifestResult<Self> {
        let mut store = OptionStore::new();

        for (name, decl) in decls {
            if store.options.contains_key(name) {
                return Err(ManifestError::DuplicateOption(name.clone()));
            }

            let value = match decl {
                Value::Bool(b) => OptionValue::Bool(*b),
                Value::Sequence(items) => {
                    let allowed = items
                        .iter()
                        .map(|item| {
                            scalar_to_string(item).ok_or_else(|| ManifestError::InvalidOption {
                                name: name.clone(),
                                reason: "choice values must be scalars".to_string(),
                            })
                        })
                        .collect::<ManifestResult<Vec<String>>>()?;
                    let choice = Choice::new(allowed).ok_or_else(|| ManifestError::InvalidOption {
                        name: name.clone(),
                        reason: "choice list is empty".to_string(),
                    })?;
                    OptionValue::Choice(choice)
                }
                other => {
                    return Err(ManifestError::InvalidOption {
                        name: name.clone(),
                        reason: format!(
                            "expected a boolean or a list of choices, got {}",
                            describe(other)
                        ),
                    })
                }
            };

            store.options.insert(name.clone(), value);
        }

        Ok(store)
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Flip a boolean option and return its new value
    pub fn toggle(&mut self, name: &str) -> OptionResult<bool> {
        match self.options.get_mut(name) {
            Some(OptionValue::Bool(b)) => {
                *b = !*b;
                Ok(*b)
            }
            Some(OptionValue::Choice(_)) => Err(OptionError::NotBoolean(name.to_string())),
            None => Err(OptionError::Unknown(name.to_string())),
        }
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> OptionResult<()> {
        match self.options.get_mut(name) {
            Some(OptionValue::Bool(b)) => {
                *b = value;
                Ok(())
            }
            Some(OptionValue::Choice(_)) => Err(OptionError::NotBoolean(name.to_string())),
            None => Err(OptionError::Unknown(name.to_string())),
        }
    }

    /// Set the active value of a choice option; the value must be allowed
    pub fn set_choice(&mut self, name: &str, value: &str) -> OptionResult<()> {
        match self.options.get_mut(name) {
            Some(OptionValue::Choice(choice)) => {
                if !choice.contains(value) {
                    return Err(OptionError::InvalidChoice {
                        name: name.to_string(),
                        value: value.to_string(),
                        allowed: choice.allowed.clone(),
                    });
                }
                choice.active = value.to_string();
                Ok(())
            }
            Some(OptionValue::Bool(_)) => Err(OptionError::NotChoice(name.to_string())),
            None => Err(OptionError::Unknown(name.to_string())),
        }
    }

    /// Apply a `NAME=VALUE` assignment to either kind of option
    pub fn assign(&mut self, assignment: &str) -> OptionResult<()> {
        let (name, value) = assignment
            .split_once('=')
            .ok_or_else(|| OptionError::InvalidAssignment(assignment.to_string()))?;
        let (name, value) = (name.trim(), value.trim());

        match self.options.get(name) {
            Some(OptionValue::Bool(_)) => {
                let parsed = value.parse::<bool>().map_err(|_| OptionError::InvalidChoice {
                    name: name.to_string(),
                    value: value.to_string(),
                    allowed: vec!["true".to_string(), "false".to_string()],
                })?;
                self.set_bool(name, parsed)
            }
            Some(OptionValue::Choice(_)) => self.set_choice(name, value),
            None => Err(OptionError::Unknown(name.to_string())),
        }
    }

    /// Carry values over from the store of a previous load
    ///
    /// Only options present in both stores with the same kind are restored.
    /// A previous choice is kept only if it is still allowed; otherwise the
    /// option stays at its new default.
    pub fn restore(&mut self, previous: &OptionStore) {
        for (name, value) in self.options.iter_mut() {
            match (value, previous.options.get(name)) {
                (OptionValue::Bool(current), Some(OptionValue::Bool(prev))) => {
                    *current = *prev;
                }
                (OptionValue::Choice(current), Some(OptionValue::Choice(prev))) => {
                    if current.contains(&prev.active) {
                        current.active = prev.active.clone();
                    } else {
                        log::debug!(
                            "option '{}': '{}' is no longer allowed, using '{}'",
                            name,
                            prev.active,
                            current.active
                        );
                    }
                }
                _ => {}
            }
        }
    }

    /// Environment variables exported for every script
    pub fn env_vars(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.options
            .iter()
            .map(|(name, value)| (name.clone(), value.env_value()))
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decls(yaml: &str) -> Vec<(String, Value)> {
        let mapping: serde_yaml::Mapping = serde_yaml::from_str(yaml).unwrap();
        mapping
            .into_iter()
            .map(|(k, v)| (k.as_str().unwrap().to_string(), v))
            .collect()
    }

    fn store(yaml: &str) -> OptionStore {
        OptionStore::from_decls(&decls(yaml)).unwrap()
    }

    #[test]
    fn test_defaults() {
        let options = store("DEBUG: true\nMODE: [release, debug]\nLEVEL: [1, 2]");
        assert_eq!(options.get("DEBUG"), Some(&OptionValue::Bool(true)));
        match options.get("MODE") {
            Some(OptionValue::Choice(choice)) => {
                assert_eq!(choice.active(), "release");
                assert_eq!(choice.allowed(), ["release", "debug"]);
            }
            other => panic!("unexpected option: {:?}", other),
        }
        assert_eq!(options.get("LEVEL").unwrap().env_value(), "1");
    }

    #[test]
    fn test_duplicate_option() {
        let decls = vec![
            ("X".to_string(), Value::Bool(true)),
            ("X".to_string(), Value::Bool(false)),
        ];
        assert!(matches!(
            OptionStore::from_decls(&decls),
            Err(ManifestError::DuplicateOption(name)) if name == "X"
        ));
    }

    #[test]
    fn test_invalid_declarations() {
        assert!(matches!(
            OptionStore::from_decls(&decls("EMPTY: []")),
            Err(ManifestError::InvalidOption { .. })
        ));
        assert!(matches!(
            OptionStore::from_decls(&decls("WORD: hello")),
            Err(ManifestError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_toggle() {
        let mut options = store("DEBUG: false\nMODE: [a, b]");
        assert!(options.toggle("DEBUG").unwrap());
        assert!(!options.toggle("DEBUG").unwrap());
        assert!(matches!(options.toggle("MODE"), Err(OptionError::NotBoolean(_))));
        assert!(matches!(options.toggle("NOPE"), Err(OptionError::Unknown(_))));
    }

    #[test]
    fn test_set_choice() {
        let mut options = store("MODE: [a, b, c]");
        options.set_choice("MODE", "c").unwrap();
        assert_eq!(options.get("MODE").unwrap().env_value(), "c");

        let result = options.set_choice("MODE", "z");
        assert!(matches!(result, Err(OptionError::InvalidChoice { .. })));
        assert_eq!(options.get("MODE").unwrap().env_value(), "c");
    }

    #[test]
    fn test_assign() {
        let mut options = store("DEBUG: false\nMODE: [a, b]");
        options.assign("DEBUG=true").unwrap();
        options.assign("MODE=b").unwrap();
        assert_eq!(options.get("DEBUG"), Some(&OptionValue::Bool(true)));
        assert_eq!(options.get("MODE").unwrap().env_value(), "b");

        assert!(matches!(
            options.assign("DEBUG"),
            Err(OptionError::InvalidAssignment(_))
        ));
        assert!(options.assign("DEBUG=maybe").is_err());
    }

    #[test]
    fn test_restore_keeps_allowed_choice() {
        let mut previous = store("MODE: [a, b, c]\nDEBUG: false");
        previous.set_choice("MODE", "b").unwrap();
        previous.toggle("DEBUG").unwrap();

        let mut reloaded = store("MODE: [c, b]\nDEBUG: false\nNEW: true");
        reloaded.restore(&previous);
        assert_eq!(reloaded.get("MODE").unwrap().env_value(), "b");
        assert_eq!(reloaded.get("DEBUG"), Some(&OptionValue::Bool(true)));
        assert_eq!(reloaded.get("NEW"), Some(&OptionValue::Bool(true)));
    }

    #[test]
    fn test_restore_resets_removed_choice() {
        let mut previous = store("MODE: [a, b, c]");
        previous.set_choice("MODE", "b").unwrap();

        let mut reloaded = store("MODE: [x, y]");
        reloaded.restore(&previous);
        assert_eq!(reloaded.get("MODE").unwrap().env_value(), "x");
    }

    #[test]
    fn test_restore_ignores_kind_change() {
        let previous = store("MODE: true");
        let mut reloaded = store("MODE: [x, y]");
        reloaded.restore(&previous);
        assert_eq!(reloaded.get("MODE").unwrap().env_value(), "x");
    }

    #[test]
    fn test_env_vars() {
        let options = store("DEBUG: true\nMODE: [fast, slow]");
        let vars: Vec<_> = options.env_vars().collect();
        assert_eq!(
            vars,
            vec![
                ("DEBUG".to_string(), "true".to_string()),
                ("MODE".to_string(), "fast".to_string()),
            ]
        );
    }
}
