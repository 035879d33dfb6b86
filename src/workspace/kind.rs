use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of descriptor kinds. Per-kind behavior lives in
/// [`KindSpec`] rather than in separate types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKind {
    Workspace,
    Application,
    Package,
    Framework,
    Toolkit,
    Theme,
}

/// Static behavior table for one [`ContextKind`].
#[derive(Debug)]
pub struct KindSpec {
    /// Prefix used when flattening the manifest into a property store.
    pub keyword: &'static str,
    pub manifest_name: &'static str,
    /// Manifest properties naming sub-package search roots.
    pub package_path_props: &'static [&'static str],
    pub default_classpath: Option<&'static str>,
    pub default_overrides: Option<&'static str>,
    /// Package manifests must carry a format marker to qualify.
    pub requires_package_marker: bool,
}

const WORKSPACE: KindSpec = KindSpec {
    keyword: "workspace",
    manifest_name: "workspace.json",
    package_path_props: &["packages.dir", "packages.extract"],
    default_classpath: None,
    default_overrides: None,
    requires_package_marker: false,
};

const APPLICATION: KindSpec = KindSpec {
    keyword: "app",
    manifest_name: "app.json",
    package_path_props: &["packages.dir", "packages.extract"],
    default_classpath: Some("app"),
    default_overrides: Some("overrides"),
    requires_package_marker: false,
};

const PACKAGE: KindSpec = KindSpec {
    keyword: "package",
    manifest_name: "package.json",
    package_path_props: &["packages.dir", "packages.extract", "subpkgs"],
    default_classpath: Some("src"),
    default_overrides: Some("overrides"),
    requires_package_marker: true,
};

const FRAMEWORK: KindSpec = KindSpec {
    keyword: "framework",
    ..PACKAGE
};

const TOOLKIT: KindSpec = KindSpec {
    keyword: "toolkit",
    package_path_props: &[],
    ..PACKAGE
};

const THEME: KindSpec = KindSpec {
    keyword: "theme",
    package_path_props: &[],
    default_classpath: Some("sass/src"),
    ..PACKAGE
};

impl ContextKind {
    pub fn spec(&self) -> &'static KindSpec {
        match self {
            ContextKind::Workspace => &WORKSPACE,
            ContextKind::Application => &APPLICATION,
            ContextKind::Package => &PACKAGE,
            ContextKind::Framework => &FRAMEWORK,
            ContextKind::Toolkit => &TOOLKIT,
            ContextKind::Theme => &THEME,
        }
    }

    pub fn keyword(&self) -> &'static str {
        self.spec().keyword
    }

    pub fn manifest_name(&self) -> &'static str {
        self.spec().manifest_name
    }

    /// Framework, Toolkit and Theme are specialized packages.
    pub fn is_package(&self) -> bool {
        matches!(
            self,
            ContextKind::Package | ContextKind::Framework | ContextKind::Toolkit | ContextKind::Theme
        )
    }

    /// Refine a generically loaded package by its manifest `type`.
    pub fn refine_package(package_type: Option<&str>) -> ContextKind {
        match package_type {
            Some("framework") => ContextKind::Framework,
            Some("toolkit") => ContextKind::Toolkit,
            Some("theme") => ContextKind::Theme,
            _ => ContextKind::Package,
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_table() {
        assert_eq!(ContextKind::Workspace.manifest_name(), "workspace.json");
        assert_eq!(ContextKind::Application.manifest_name(), "app.json");
        assert_eq!(ContextKind::Framework.manifest_name(), "package.json");
        assert_eq!(ContextKind::Framework.keyword(), "framework");

        assert!(ContextKind::Toolkit.spec().package_path_props.is_empty());
        assert!(ContextKind::Theme.spec().package_path_props.is_empty());
        assert!(ContextKind::Framework.spec().package_path_props.contains(&"subpkgs"));
        assert!(!ContextKind::Workspace.spec().requires_package_marker);
    }

    #[test]
    fn test_refine_package() {
        assert_eq!(ContextKind::refine_package(Some("theme")), ContextKind::Theme);
        assert_eq!(ContextKind::refine_package(Some("code")), ContextKind::Package);
        assert_eq!(ContextKind::refine_package(None), ContextKind::Package);
        assert!(ContextKind::Toolkit.is_package());
        assert!(!ContextKind::Application.is_package());
    }
}
