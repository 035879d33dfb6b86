use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{ConfigError, ConfigResult};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

/// Ordered mapping of dotted configuration keys to scalar values.
///
/// The first write to a key wins; later writes are ignored. Contexts rely on
/// this by flattening their own manifest before their workspace's.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under `key` unless the key is already set.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value.into()));
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Register one entry per leaf scalar of `data` under `prefix`.
    /// Arrays of scalars are comma-joined into a single entry.
    pub fn flatten(&mut self, prefix: &str, data: &Value) {
        match data {
            Value::Object(map) => {
                for (key, value) in map {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    self.flatten(&path, value);
                }
            }
            Value::Array(items) => {
                let joined: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
                if !joined.is_empty() {
                    self.add(prefix, joined.join(","));
                }
            }
            other => {
                if let Some(value) = scalar_to_string(other) {
                    self.add(prefix, value);
                }
            }
        }
    }

    /// Copy every entry of `other`, keeping values already present here.
    pub fn inherit(&mut self, other: &PropertyStore) {
        for (key, value) in other.iter() {
            self.add(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every `${key}` in `text` with the stored value, expanding
    /// placeholders inside substituted values as well.
    /// `owner` names the directory reported when a key is missing.
    pub fn expand(&self, text: &str, owner: &Path) -> ConfigResult<String> {
        self.expand_with(text, owner, &mut Vec::new())
    }

    fn expand_with(&self, text: &str, owner: &Path, visiting: &mut Vec<String>) -> ConfigResult<String> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let key = caps[1].trim();
            if visiting.iter().any(|k| k == key) {
                return Err(ConfigError::CyclicProperty {
                    key: key.to_string(),
                    dir: owner.to_path_buf(),
                });
            }
            let value = self.get(key).ok_or_else(|| ConfigError::MissingProperty {
                key: key.to_string(),
                dir: owner.to_path_buf(),
            })?;

            visiting.push(key.to_string());
            let value = self.expand_with(value, owner, visiting)?;
            visiting.pop();

            out.push_str(&text[last..whole.start()]);
            out.push_str(&value);
            last = whole.end();
        }

        out.push_str(&text[last..]);
        Ok(out)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
