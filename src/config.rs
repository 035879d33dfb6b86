use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::diagnostics::Severity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_registration_functions")]
    pub registration_functions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_threshold")]
    pub default_threshold: Severity,
    /// Per-code severity overrides, keyed by diagnostic code.
    #[serde(default)]
    pub levels: HashMap<String, Severity>,
    /// Per-code minimum severity to surface, keyed by diagnostic code.
    #[serde(default)]
    pub thresholds: HashMap<String, Severity>,
}

fn default_extension() -> String {
    "js".to_string()
}

fn default_registration_functions() -> Vec<String> {
    vec!["Ext.define".to_string()]
}

fn default_threshold() -> Severity {
    Severity::Warn
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            registration_functions: default_registration_functions(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            default_threshold: default_threshold(),
            levels: HashMap::new(),
            thresholds: HashMap::new(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    pub fn from_workspace_root<P: AsRef<std::path::Path>>(workspace_root: P) -> Result<Self> {
        let mut config = Self::default();
        config.workspace.root = workspace_root.as_ref().to_path_buf();
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: WorkspaceConfig {
                root: PathBuf::from("."),
            },
            sources: SourcesConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("analyzer.toml");
        std::fs::write(
            &path,
            r#"
[workspace]
root = "/projects/demo"

[sources]
registration_functions = ["Ext.define", "MyApp.define"]

[diagnostics]
default_threshold = "info"

[diagnostics.levels]
registration-shape = "error"
"#,
        )
        .unwrap();

        let config = Config::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.workspace.root, PathBuf::from("/projects/demo"));
        assert_eq!(config.sources.extension, "js");
        assert_eq!(config.sources.registration_functions, vec!["Ext.define", "MyApp.define"]);
        assert_eq!(config.diagnostics.default_threshold, Severity::Info);
        assert_eq!(
            config.diagnostics.levels.get("registration-shape"),
            Some(&Severity::Error)
        );
    }

    #[test]
    fn test_default_config() {
        let config = Config::from_workspace_root("/tmp/ws").unwrap();
        assert_eq!(config.workspace.root, PathBuf::from("/tmp/ws"));
        assert_eq!(config.sources.registration_functions, vec!["Ext.define"]);
        assert_eq!(config.diagnostics.default_threshold, Severity::Warn);
    }
}
