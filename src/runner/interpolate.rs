//! Variable interpolation and environment resolution
//!
//! Placeholders use the `${NAME}` syntax. Substitution is permissive: a
//! placeholder whose name is unknown is left in place as literal text.

use crate::config::EnvEntry;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").expect("placeholder pattern is valid"));

/// Replace every `${NAME}` in `s` for which `lookup` yields a value
pub fn substitute<'a, F>(s: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    PLACEHOLDER
        .replace_all(s, |caps: &Captures<'_>| match lookup(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Interpolate a string against a single variable map
pub fn interpolate(s: &str, vars: &BTreeMap<String, String>) -> String {
    substitute(s, |name| vars.get(name).map(String::as_str))
}

/// Resolved process environment for one manifest load
///
/// Built from three layers: the inherited process environment, values
/// synthesized by grml (`ROOT`, `PROJECT`, `NUMCPU`, `PWD`) and the
/// manifest's ordered `env` declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Resolve the manifest declarations against the inherited and synthesized values
    ///
    /// Each declaration sees only the declarations before it, then the
    /// synthesized values, then the inherited environment. In the merged
    /// result declared values override inherited ones, while synthesized
    /// values override both.
    pub fn resolve(
        inherited: &BTreeMap<String, String>,
        synthesized: &BTreeMap<String, String>,
        entries: &[EnvEntry],
    ) -> Self {
        let mut declared: BTreeMap<String, String> = BTreeMap::new();

        for entry in entries {
            let value = substitute(&entry.value, |name| {
                declared
                    .get(name)
                    .or_else(|| synthesized.get(name))
                    .or_else(|| inherited.get(name))
                    .map(String::as_str)
            });
            if synthesized.contains_key(&entry.key) {
                log::debug!("env '{}' is shadowed by the synthesized value", entry.key);
            }
            declared.insert(entry.key.clone(), value);
        }

        let mut vars = inherited.clone();
        vars.extend(declared);
        vars.extend(synthesized.iter().map(|(k, v)| (k.clone(), v.clone())));

        Environment { vars }
    }

    /// Evaluate placeholders in help texts, dependency references and paths
    pub fn substitute(&self, s: &str) -> String {
        interpolate(s, &self.vars)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }
}
