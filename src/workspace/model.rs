use serde_json::Value;
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::properties::PropertyStore;
use crate::workspace::kind::ContextKind;
use crate::workspace::manifest::{self, lookup, path_list};
use crate::workspace::paths;

/// Handle to a [`Context`] owned by a [`ProjectModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(usize);

/// Who asked for a context to be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Creator {
    /// The project model itself, e.g. a lookup starting from a bare directory.
    Manager,
    Context(ContextId),
}

/// A manifest-bearing directory of a known kind.
#[derive(Debug)]
pub struct Context {
    id: ContextId,
    kind: ContextKind,
    dir: PathBuf,
    manifest_file: PathBuf,
    manifest: Value,
    creator: Option<Creator>,
    cache: ContextCache,
}

#[derive(Debug, Default)]
struct ContextCache {
    workspace: OnceCell<ContextId>,
    framework: OnceCell<Option<ContextId>>,
    toolkit: OnceCell<Option<ContextId>>,
    theme: OnceCell<Option<ContextId>>,
    classpath: OnceCell<Vec<PathBuf>>,
    overrides: OnceCell<Vec<PathBuf>>,
    package_path: OnceCell<Vec<PathBuf>>,
    packages: OnceCell<Vec<(String, ContextId)>>,
    applications: OnceCell<Vec<ContextId>>,
    frameworks: OnceCell<Vec<(String, ContextId)>>,
    props: RefCell<Option<Rc<PropertyStore>>>,
}

impl Context {
    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    /// Absolute, normalized directory of this context.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest_file(&self) -> &Path {
        &self.manifest_file
    }

    /// Manifest document. Current-shape package manifests are already
    /// promoted to top level.
    pub fn manifest(&self) -> &Value {
        &self.manifest
    }

    pub fn creator(&self) -> Option<Creator> {
        self.creator
    }

    pub fn name(&self) -> String {
        self.manifest
            .get("name")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| {
                self.dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
    }

    pub fn version(&self) -> Option<&str> {
        self.manifest.get("version").and_then(Value::as_str)
    }

    fn manifest_str(&self, key: &str) -> Option<&str> {
        self.manifest.get(key).and_then(Value::as_str)
    }
}

/// Arena of every context loaded during a session.
///
/// Contexts are keyed by directory and manifest file, so loading the same
/// directory twice yields the same context even when it is first reached as a
/// generic package and later as a framework, toolkit or theme. Contexts refer to each other by
/// [`ContextId`] only.
#[derive(Debug, Default)]
pub struct ProjectModel {
    contexts: RefCell<Vec<Rc<Context>>>,
    loaded: RefCell<HashMap<(PathBuf, &'static str), ContextId>>,
}

impl ProjectModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ContextId) -> Rc<Context> {
        Rc::clone(&self.contexts.borrow()[id.0])
    }

    pub fn len(&self) -> usize {
        self.contexts.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.borrow().is_empty()
    }

    pub fn at(&self, kind: ContextKind, dir: &Path) -> bool {
        manifest::qualifies(kind, &paths::normalize(dir))
    }

    /// Load `dir` as `kind`. Returns `None` without side effects when the
    /// directory does not carry the kind's manifest.
    pub fn load(
        &self,
        kind: ContextKind,
        dir: &Path,
        creator: Option<Creator>,
    ) -> ConfigResult<Option<ContextId>> {
        let dir = paths::normalize(dir);
        let key = (dir.clone(), kind.manifest_name());
        if let Some(&id) = self.loaded.borrow().get(&key) {
            return Ok(Some(id));
        }
        if !manifest::qualifies(kind, &dir) {
            return Ok(None);
        }

        let manifest_file = dir.join(kind.manifest_name());
        let mut document = manifest::read_manifest(&manifest_file)?;
        let mut resolved_kind = kind;

        if kind.is_package() {
            let shape = manifest::package_shape(&document, &manifest_file)?.ok_or_else(|| {
                ConfigError::MalformedManifest {
                    path: manifest_file.clone(),
                    reason: "missing package format marker".to_string(),
                }
            })?;
            document = manifest::normalize_package(document, shape);
            // The manifest's own type wins over the kind the caller asked for.
            match ContextKind::refine_package(document.get("type").and_then(Value::as_str)) {
                ContextKind::Package => {}
                refined => resolved_kind = refined,
            }
        }

        let id = ContextId(self.contexts.borrow().len());
        let context = Context {
            id,
            kind: resolved_kind,
            dir: dir.clone(),
            manifest_file,
            manifest: document,
            creator,
            cache: ContextCache::default(),
        };

        // A creator that is already resolved hands its workspace down.
        if let Some(Creator::Context(creator_id)) = creator {
            let parent = self.get(creator_id);
            let known = if parent.kind == ContextKind::Workspace {
                Some(creator_id)
            } else {
                parent.cache.workspace.get().copied()
            };
            if let Some(ws) = known {
                let _ = context.cache.workspace.set(ws);
            }
        }

        debug!("Loaded {} context {} at {:?}", resolved_kind, context.name(), dir);
        self.contexts.borrow_mut().push(Rc::new(context));
        self.loaded.borrow_mut().insert(key, id);
        Ok(Some(id))
    }

    /// Walk upward from `dir` to the nearest directory qualifying as `kind`.
    pub fn from(
        &self,
        kind: ContextKind,
        dir: &Path,
        creator: Option<Creator>,
    ) -> ConfigResult<Option<ContextId>> {
        match paths::find_upward(dir, |d| manifest::qualifies(kind, d)) {
            Some(found) => self.load(kind, &found, creator),
            None => Ok(None),
        }
    }

    /// Resolve the nearest typed directory above `dir`, preferring an
    /// application over a package over a workspace in the same directory.
    pub fn discover(&self, dir: &Path) -> ConfigResult<Option<ContextId>> {
        const ORDER: [ContextKind; 3] = [
            ContextKind::Application,
            ContextKind::Package,
            ContextKind::Workspace,
        ];

        let found = paths::find_upward(dir, |d| ORDER.iter().any(|k| manifest::qualifies(*k, d)));
        let Some(found) = found else {
            return Ok(None);
        };

        for kind in ORDER {
            if manifest::qualifies(kind, &found) {
                return self.load(kind, &found, Some(Creator::Manager));
            }
        }
        Ok(None)
    }

    /// Owning workspace, taken from the creator chain when known and
    /// otherwise found upward from the context directory.
    pub fn workspace(&self, id: ContextId) -> ConfigResult<ContextId> {
        let ctx = self.get(id);
        if ctx.kind == ContextKind::Workspace {
            return Ok(id);
        }
        if let Some(&ws) = ctx.cache.workspace.get() {
            return Ok(ws);
        }

        let ws = match ctx.creator {
            Some(Creator::Context(creator)) if creator != id => self.workspace(creator)?,
            _ => self
                .from(ContextKind::Workspace, &ctx.dir, Some(Creator::Context(id)))?
                .ok_or_else(|| ConfigError::MissingWorkspace(ctx.dir.clone()))?,
        };

        let _ = ctx.cache.workspace.set(ws);
        Ok(ws)
    }

    /// Applications declared by the workspace's `apps` property.
    pub fn applications(&self, id: ContextId) -> ConfigResult<Vec<ContextId>> {
        let ws_id = self.workspace(id)?;
        let ws = self.get(ws_id);
        if let Some(apps) = ws.cache.applications.get() {
            return Ok(apps.clone());
        }

        let props = self.config_props(ws_id, false)?;
        let mut apps = Vec::new();
        for entry in ws.manifest.get("apps").map(path_list).unwrap_or_default() {
            let dir = paths::resolve(&ws.dir, &props.expand(&entry, &ws.dir)?);
            if !dir.is_dir() {
                return Err(ConfigError::MissingDirectory(dir));
            }
            match self.load(ContextKind::Application, &dir, Some(Creator::Context(ws_id)))? {
                Some(app) => {
                    if !apps.contains(&app) {
                        apps.push(app);
                    }
                }
                None => warn!("Workspace app entry {:?} has no app manifest", dir),
            }
        }

        let _ = ws.cache.applications.set(apps.clone());
        Ok(apps)
    }

    /// Named frameworks declared by the workspace's `frameworks` table.
    pub fn frameworks(&self, id: ContextId) -> ConfigResult<Vec<(String, ContextId)>> {
        let ws_id = self.workspace(id)?;
        let ws = self.get(ws_id);
        if let Some(frameworks) = ws.cache.frameworks.get() {
            return Ok(frameworks.clone());
        }

        let props = self.config_props(ws_id, false)?;
        let mut frameworks = Vec::new();
        if let Some(Value::Object(table)) = ws.manifest.get("frameworks") {
            for (name, entry) in table {
                let path = entry
                    .as_str()
                    .or_else(|| entry.get("path").and_then(Value::as_str))
                    .ok_or_else(|| ConfigError::MissingProperty {
                        key: format!("workspace.frameworks.{}.path", name),
                        dir: ws.dir.clone(),
                    })?;
                let dir = paths::resolve(&ws.dir, &props.expand(path, &ws.dir)?);
                if !dir.is_dir() {
                    return Err(ConfigError::MissingDirectory(dir));
                }
                let framework = self
                    .load(ContextKind::Framework, &dir, Some(Creator::Context(ws_id)))?
                    .ok_or_else(|| ConfigError::UnknownFramework {
                        name: name.clone(),
                        from: ws.dir.clone(),
                    })?;
                frameworks.push((name.clone(), framework));
            }
        }

        let _ = ws.cache.frameworks.set(frameworks.clone());
        Ok(frameworks)
    }

    /// Framework used by an application or package.
    pub fn framework(&self, id: ContextId) -> ConfigResult<Option<ContextId>> {
        let ctx = self.get(id);
        match ctx.kind {
            ContextKind::Workspace => return Ok(None),
            ContextKind::Framework => return Ok(Some(id)),
            _ => {}
        }
        if let Some(&framework) = ctx.cache.framework.get() {
            return Ok(framework);
        }

        let framework = match ctx.manifest_str("framework") {
            Some(name) => Some(self.resolve_framework(&ctx, name)?),
            None => match ctx.creator {
                Some(Creator::Context(creator))
                    if creator != id && self.get(creator).kind != ContextKind::Workspace =>
                {
                    self.framework(creator)?
                }
                _ if ctx.kind == ContextKind::Application => {
                    return Err(ConfigError::MissingProperty {
                        key: "app.framework".to_string(),
                        dir: ctx.dir.clone(),
                    });
                }
                _ => None,
            },
        };

        let _ = ctx.cache.framework.set(framework);
        Ok(framework)
    }

    fn resolve_framework(&self, ctx: &Context, name: &str) -> ConfigResult<ContextId> {
        let mut candidates = vec![ctx.dir.join(name)];

        match self.workspace(ctx.id) {
            Ok(ws_id) => {
                if let Some((_, framework)) = self
                    .frameworks(ws_id)?
                    .into_iter()
                    .find(|(fw_name, _)| fw_name == name)
                {
                    return Ok(framework);
                }
                candidates.push(self.get(ws_id).dir.join(name));
            }
            Err(ConfigError::MissingWorkspace(_)) => {}
            Err(e) => return Err(e),
        }

        for candidate in candidates {
            if !candidate.is_dir() {
                continue;
            }
            if let Some(framework) =
                self.load(ContextKind::Framework, &candidate, Some(Creator::Context(ctx.id)))?
            {
                return Ok(framework);
            }
        }

        Err(ConfigError::UnknownFramework {
            name: name.to_string(),
            from: ctx.dir.clone(),
        })
    }

    /// Toolkit named by the manifest, looked up in the framework's packages.
    pub fn toolkit(&self, id: ContextId) -> ConfigResult<Option<ContextId>> {
        let ctx = self.get(id);
        if let Some(&toolkit) = ctx.cache.toolkit.get() {
            return Ok(toolkit);
        }

        let toolkit = match ctx.manifest_str("toolkit") {
            Some(name) => {
                let framework =
                    self.framework(id)?
                        .ok_or_else(|| ConfigError::MissingProperty {
                            key: format!("{}.framework", ctx.kind.keyword()),
                            dir: ctx.dir.clone(),
                        })?;
                let package = self.package(framework, name)?.ok_or_else(|| {
                    ConfigError::UnknownPackage {
                        name: name.to_string(),
                        from: ctx.dir.clone(),
                    }
                })?;
                let dir = self.get(package).dir.clone();
                self.load(ContextKind::Toolkit, &dir, Some(Creator::Context(framework)))?
            }
            None => None,
        };

        let _ = ctx.cache.toolkit.set(toolkit);
        Ok(toolkit)
    }

    /// Theme named by the manifest, searched in the context's own packages,
    /// then the workspace's, then the framework's.
    pub fn theme(&self, id: ContextId) -> ConfigResult<Option<ContextId>> {
        let ctx = self.get(id);
        if let Some(&theme) = ctx.cache.theme.get() {
            return Ok(theme);
        }

        let theme = match ctx.manifest_str("theme") {
            Some(name) => {
                let mut scopes = vec![id];
                match self.workspace(id) {
                    Ok(ws) => scopes.push(ws),
                    Err(ConfigError::MissingWorkspace(_)) => {}
                    Err(e) => return Err(e),
                }
                if let Some(framework) = self.framework(id)? {
                    scopes.push(framework);
                }

                let mut found = None;
                for scope in scopes {
                    if let Some(package) = self.package(scope, name)? {
                        found = Some(package);
                        break;
                    }
                }
                let package = found.ok_or_else(|| ConfigError::UnknownPackage {
                    name: name.to_string(),
                    from: ctx.dir.clone(),
                })?;
                let dir = self.get(package).dir.clone();
                self.load(ContextKind::Theme, &dir, Some(Creator::Context(id)))?
            }
            None => None,
        };

        let _ = ctx.cache.theme.set(theme);
        Ok(theme)
    }

    /// Package directories reachable from the kind's package-path properties.
    ///
    /// Entries are resolved against the context directory, missing and
    /// duplicate directories are dropped, and a directory holding packages is
    /// replaced by its immediate package subdirectories.
    pub fn package_path(&self, id: ContextId) -> ConfigResult<Vec<PathBuf>> {
        let ctx = self.get(id);
        if let Some(cached) = ctx.cache.package_path.get() {
            return Ok(cached.clone());
        }

        let props = self.config_props(id, false)?;
        let mut roots = Vec::new();
        for prop in ctx.kind.spec().package_path_props {
            let Some(value) = lookup(&ctx.manifest, prop) else {
                continue;
            };
            for entry in path_list(value) {
                let expanded = props.expand(&entry, &ctx.dir)?;
                roots.push(paths::resolve(&ctx.dir, &expanded));
            }
        }

        let mut resolved = Vec::new();
        for root in paths::dedup(roots) {
            if !root.is_dir() {
                debug!("Skipping missing package root {:?}", root);
                continue;
            }
            if manifest::qualifies(ContextKind::Package, &root) {
                resolved.push(root);
                continue;
            }

            let packages: Vec<PathBuf> = paths::subdirectories(&root)
                .into_iter()
                .filter(|dir| manifest::qualifies(ContextKind::Package, dir))
                .map(|dir| paths::normalize(&dir))
                .collect();
            if packages.is_empty() {
                resolved.push(root);
            } else {
                resolved.extend(packages);
            }
        }

        let resolved = paths::dedup(resolved);
        let _ = ctx.cache.package_path.set(resolved.clone());
        Ok(resolved)
    }

    /// Package catalog by name. The first package registered under a name wins.
    pub fn packages(&self, id: ContextId) -> ConfigResult<Vec<(String, ContextId)>> {
        let ctx = self.get(id);
        if let Some(cached) = ctx.cache.packages.get() {
            return Ok(cached.clone());
        }

        let mut catalog: Vec<(String, ContextId)> = Vec::new();
        for dir in self.package_path(id)? {
            let Some(package) =
                self.load(ContextKind::Package, &dir, Some(Creator::Context(id)))?
            else {
                continue;
            };
            let name = self.get(package).name();
            if catalog.iter().any(|(existing, _)| *existing == name) {
                debug!("Package {} at {:?} shadowed by an earlier entry", name, dir);
                continue;
            }
            catalog.push((name, package));
        }

        let _ = ctx.cache.packages.set(catalog.clone());
        Ok(catalog)
    }

    pub fn package(&self, id: ContextId, name: &str) -> ConfigResult<Option<ContextId>> {
        Ok(self
            .packages(id)?
            .into_iter()
            .find(|(package_name, _)| package_name == name)
            .map(|(_, package)| package))
    }

    /// Classpath entries that exist, in manifest order.
    pub fn classpath(&self, id: ContextId) -> ConfigResult<Vec<PathBuf>> {
        let ctx = self.get(id);
        if let Some(cached) = ctx.cache.classpath.get() {
            return Ok(cached.clone());
        }
        let resolved = self.path_property(&ctx, "classpath", ctx.kind.spec().default_classpath)?;
        let _ = ctx.cache.classpath.set(resolved.clone());
        Ok(resolved)
    }

    pub fn overrides(&self, id: ContextId) -> ConfigResult<Vec<PathBuf>> {
        let ctx = self.get(id);
        if let Some(cached) = ctx.cache.overrides.get() {
            return Ok(cached.clone());
        }
        let resolved = self.path_property(&ctx, "overrides", ctx.kind.spec().default_overrides)?;
        let _ = ctx.cache.overrides.set(resolved.clone());
        Ok(resolved)
    }

    /// Source files under the classpath, walked depth first.
    pub fn class_files(&self, id: ContextId, extension: &str) -> ConfigResult<Vec<PathBuf>> {
        let files = self
            .classpath(id)?
            .iter()
            .flat_map(|entry| paths::walk_sources(entry, extension))
            .collect();
        Ok(paths::dedup(files))
    }

    pub fn override_files(&self, id: ContextId, extension: &str) -> ConfigResult<Vec<PathBuf>> {
        let files = self
            .overrides(id)?
            .iter()
            .flat_map(|entry| paths::walk_sources(entry, extension))
            .collect();
        Ok(paths::dedup(files))
    }

    fn path_property(
        &self,
        ctx: &Context,
        prop: &str,
        default: Option<&str>,
    ) -> ConfigResult<Vec<PathBuf>> {
        let (entries, explicit) = match ctx.manifest.get(prop) {
            Some(value) => (path_list(value), true),
            None => (default.map(|d| vec![d.to_string()]).unwrap_or_default(), false),
        };

        let props = self.config_props(ctx.id, false)?;
        let mut resolved = Vec::new();
        for entry in entries {
            let path = paths::resolve(&ctx.dir, &props.expand(&entry, &ctx.dir)?);
            if !path.exists() {
                if explicit {
                    warn!("{} entry {:?} of {} does not exist", prop, path, ctx.name());
                }
                continue;
            }
            resolved.push(path);
        }

        Ok(paths::dedup(resolved))
    }

    /// Merged property store: the context's own manifest under its kind
    /// keyword, then everything inherited from the workspace.
    pub fn config_props(&self, id: ContextId, refresh: bool) -> ConfigResult<Rc<PropertyStore>> {
        let ctx = self.get(id);
        if !refresh {
            if let Some(store) = ctx.cache.props.borrow().as_ref() {
                return Ok(Rc::clone(store));
            }
        }

        let keyword = ctx.kind.keyword();
        let mut store = PropertyStore::new();
        store.add(format!("{}.dir", keyword), ctx.dir.to_string_lossy());
        store.flatten(keyword, &ctx.manifest);

        if ctx.kind != ContextKind::Workspace {
            match self.workspace(id) {
                Ok(ws) => {
                    let inherited = self.config_props(ws, refresh)?;
                    store.inherit(&inherited);
                }
                Err(ConfigError::MissingWorkspace(_)) => {
                    debug!("{} has no workspace; using its own properties only", ctx.name());
                }
                Err(e) => return Err(e),
            }
        }

        let store = Rc::new(store);
        *ctx.cache.props.borrow_mut() = Some(Rc::clone(&store));
        Ok(store)
    }

    pub fn get_prop(&self, id: ContextId, key: &str) -> ConfigResult<Option<String>> {
        Ok(self.config_props(id, false)?.get(key).map(String::from))
    }

    /// Drop the cached property store so the next access recomputes it.
    pub fn refresh(&self, id: ContextId) {
        self.get(id).cache.props.borrow_mut().take();
    }
}
