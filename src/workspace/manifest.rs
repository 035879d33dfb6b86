use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::workspace::kind::ContextKind;

/// Key holding the nested package descriptor in current-shape package manifests.
const PACKAGE_MARKER: &str = "sencha";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageShape {
    /// Package fields nested under the marker object.
    Current,
    /// Package fields at top level with a `type` string.
    Legacy,
}

/// Read a manifest, tolerating `//` and `/* */` comments.
pub fn read_manifest(path: &Path) -> ConfigResult<Value> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    parse_manifest(&text).map_err(|e| ConfigError::MalformedManifest {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub fn parse_manifest(text: &str) -> serde_json::Result<Value> {
    serde_json::from_str(&strip_comments(text))
}

/// Remove comments outside of string literals. Newlines inside block
/// comments are kept so serde_json error positions stay meaningful.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        out.push('\n');
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Detect the package manifest shape, if any.
pub fn package_shape(manifest: &Value, path: &Path) -> ConfigResult<Option<PackageShape>> {
    match manifest.get(PACKAGE_MARKER) {
        Some(Value::Object(_)) => Ok(Some(PackageShape::Current)),
        Some(_) => Err(ConfigError::MalformedManifest {
            path: path.to_path_buf(),
            reason: format!("`{}` must be an object", PACKAGE_MARKER),
        }),
        None => match manifest.get("type") {
            Some(Value::String(_)) => Ok(Some(PackageShape::Legacy)),
            _ => Ok(None),
        },
    }
}

/// Promote the nested descriptor of a current-shape package to top level.
/// `name` and `version` fall back to the outer document.
pub fn normalize_package(manifest: Value, shape: PackageShape) -> Value {
    if shape == PackageShape::Legacy {
        return manifest;
    }

    let Value::Object(mut outer) = manifest else {
        return manifest;
    };
    let mut promoted = match outer.remove(PACKAGE_MARKER) {
        Some(Value::Object(inner)) => inner,
        _ => Map::new(),
    };

    for key in ["name", "version"] {
        if !promoted.contains_key(key) {
            if let Some(value) = outer.get(key) {
                promoted.insert(key.to_string(), value.clone());
            }
        }
    }

    Value::Object(promoted)
}

/// Check whether `dir` carries a manifest qualifying it as `kind`.
///
/// A package manifest with a malformed marker still qualifies so that
/// loading it fails loudly.
pub fn qualifies(kind: ContextKind, dir: &Path) -> bool {
    let manifest_path = dir.join(kind.manifest_name());
    if !manifest_path.is_file() {
        return false;
    }
    if !kind.spec().requires_package_marker {
        return true;
    }

    match read_manifest(&manifest_path) {
        Ok(manifest) => !matches!(package_shape(&manifest, &manifest_path), Ok(None)),
        Err(_) => false,
    }
}

/// Look up a dotted property path in a manifest document.
pub fn lookup<'a>(manifest: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(manifest, |value, segment| value.get(segment))
}

/// Read a path-list property: a comma-separated string or an array of strings.
pub fn path_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(|s| s.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}
