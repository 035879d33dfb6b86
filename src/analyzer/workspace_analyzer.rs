use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

use crate::analyzer::catalog::ClassCatalog;
use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::incremental::{SymbolIndex, SyncReport};
use crate::sources::{SourceCollection, SourceFile, SourceLoader};
use crate::workspace::{ContextId, ProjectModel};

/// Sources of one context together with the index built over them.
pub struct WorkspaceSnapshot {
    pub context: ContextId,
    pub sources: SourceCollection,
    pub index: SymbolIndex,
}

/// Ties descriptor resolution, source loading and indexing together for a
/// single session.
pub struct WorkspaceAnalyzer {
    config: Config,
    project: ProjectModel,
    loader: SourceLoader,
    diagnostics: Diagnostics,
}

impl WorkspaceAnalyzer {
    pub fn new<P: AsRef<Path>>(workspace_root: P) -> Result<Self> {
        let config = Config::from_workspace_root(workspace_root.as_ref())?;
        Ok(Self::new_with_config(config))
    }

    pub fn new_with_config(config: Config) -> Self {
        let loader = SourceLoader::new(&config);
        let diagnostics = Diagnostics::from_config(&config.diagnostics);

        Self {
            config,
            project: ProjectModel::new(),
            loader,
            diagnostics,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn project(&self) -> &ProjectModel {
        &self.project
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Nearest typed context at or above `dir`.
    pub fn discover(&self, dir: &Path) -> Result<ContextId> {
        self.project
            .discover(dir)?
            .with_context(|| format!("No workspace, app or package manifest found above {:?}", dir))
    }

    /// Context for the configured workspace root.
    pub fn root_context(&self) -> Result<ContextId> {
        self.discover(&self.config.workspace.root)
    }

    /// Load the context's sources and index them.
    pub async fn create_snapshot(&mut self, context: ContextId) -> Result<WorkspaceSnapshot> {
        let sources = self.loader.load(&self.project, context).await?;
        let index = SymbolIndex::new(&self.config, &sources, &mut self.diagnostics)?;

        Ok(WorkspaceSnapshot {
            context,
            sources,
            index,
        })
    }

    /// Re-resolve the context's file list and bring the snapshot's sources in
    /// line with disk, then synchronize its index. A listed file whose content
    /// hash changed gets a fresh handle, so the index re-parses only that file.
    pub async fn refresh_snapshot(&mut self, snapshot: &mut WorkspaceSnapshot) -> Result<SyncReport> {
        let wanted: Vec<PathBuf> = self
            .loader
            .resolve(&self.project, snapshot.context)?
            .into_iter()
            .filter(|path| path.is_file())
            .collect();
        let wanted_set: HashSet<&Path> = wanted.iter().map(PathBuf::as_path).collect();

        let stale: Vec<Rc<SourceFile>> = snapshot
            .sources
            .iter()
            .filter(|source| !wanted_set.contains(source.path()))
            .cloned()
            .collect();
        for source in &stale {
            snapshot.sources.remove(source);
        }

        for path in &wanted {
            let fresh = SourceFile::read(path).await?;
            if let Some(existing) = snapshot.sources.get(path).cloned() {
                if existing.hash() == fresh.hash() {
                    continue;
                }
                debug!("Content of {:?} changed", path);
                snapshot.sources.remove(&existing);
            }
            snapshot.sources.push(Rc::new(fresh));
        }

        let report = snapshot.index.sync(&snapshot.sources, &mut self.diagnostics)?;
        info!(
            "Refreshed {}: {} added, {} removed",
            self.project.get(snapshot.context).name(),
            report.added.len(),
            report.removed.len()
        );
        Ok(report)
    }

    pub fn classes<'a>(&mut self, snapshot: &'a mut WorkspaceSnapshot) -> &'a ClassCatalog {
        snapshot.index.classes(&mut self.diagnostics)
    }
}
