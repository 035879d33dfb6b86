use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

use crate::analyzer::catalog::ClassCatalog;
use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::parser::js_parser::{report_syntax_errors, RegistrationScanner};
use crate::parser::symbols::FileSymbols;
use crate::parser::JsParser;
use crate::sources::{SourceCollection, SourceFile};

/// Incrementally maintained class index over a source collection.
///
/// Each attached file is parsed once. `sync` attaches new files, detaches
/// files that left the collection, and leaves everything else untouched.
pub struct SymbolIndex {
    parser: JsParser,
    registration_functions: Vec<String>,
    files: Vec<Rc<FileSymbols>>,
    by_path: HashMap<PathBuf, Rc<FileSymbols>>,
    catalog: Option<ClassCatalog>,
    reported_duplicates: HashSet<(String, PathBuf)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub unchanged: usize,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStatistics {
    pub tracked_files: usize,
    pub total_classes: usize,
    pub catalog_built: bool,
}

impl SymbolIndex {
    pub fn new(config: &Config, sources: &SourceCollection, diagnostics: &mut Diagnostics) -> Result<Self> {
        let parser = JsParser::new().context("Failed to create JavaScript parser")?;

        let mut index = Self {
            parser,
            registration_functions: config.sources.registration_functions.clone(),
            files: Vec::new(),
            by_path: HashMap::new(),
            catalog: None,
            reported_duplicates: HashSet::new(),
        };

        for source in sources.iter() {
            index.attach(Rc::clone(source), diagnostics)?;
        }

        info!("Indexed {} files", index.files.len());
        Ok(index)
    }

    fn attach(&mut self, source: Rc<SourceFile>, diagnostics: &mut Diagnostics) -> Result<()> {
        let tree = source.syntax(&mut self.parser)?;
        report_syntax_errors(tree, source.path(), diagnostics);
        let registrations = RegistrationScanner::new(&self.registration_functions, source.path(), source.text())
            .scan(tree, diagnostics);

        debug!("{:?}: {} registrations", source.path(), registrations.len());
        let table = FileSymbols::from_registrations(Rc::clone(&source), registrations);
        self.by_path.insert(source.path().to_path_buf(), Rc::clone(&table));
        self.files.push(table);
        Ok(())
    }

    /// Attached symbol tables, in attachment order.
    pub fn files(&self) -> &[Rc<FileSymbols>] {
        &self.files
    }

    pub fn file(&self, path: &Path) -> Option<&Rc<FileSymbols>> {
        self.by_path.get(path)
    }

    /// The merged catalog, built on first access after construction or a
    /// `sync` that changed the file set.
    pub fn classes(&mut self, diagnostics: &mut Diagnostics) -> &ClassCatalog {
        if self.catalog.is_none() {
            let catalog = ClassCatalog::build(&self.files, diagnostics, &mut self.reported_duplicates);
            debug!("Built class catalog with {} classes", catalog.len());
            self.catalog = Some(catalog);
        }
        self.catalog.get_or_insert_with(ClassCatalog::default)
    }

    /// Reconcile attached files with the collection's current contents.
    ///
    /// A file is unchanged when its path is attached and the collection still
    /// holds the same handle; a replaced handle is detached and re-attached.
    pub fn sync(&mut self, sources: &SourceCollection, diagnostics: &mut Diagnostics) -> Result<SyncReport> {
        let start = std::time::Instant::now();
        let mut report = SyncReport::default();

        let current: HashMap<&Path, &Rc<SourceFile>> =
            sources.iter().map(|source| (source.path(), source)).collect();

        let departed: Vec<PathBuf> = self
            .by_path
            .iter()
            .filter(|(path, table)| match current.get(path.as_path()) {
                Some(source) => !Rc::ptr_eq(source, table.source()),
                None => true,
            })
            .map(|(path, _)| path.clone())
            .collect();

        if !departed.is_empty() {
            self.catalog = None;
            let departed_set: HashSet<&PathBuf> = departed.iter().collect();
            self.files.retain(|table| !departed_set.contains(&table.path().to_path_buf()));
            for path in &departed {
                self.by_path.remove(path);
            }
        }

        for source in sources.iter() {
            if self.by_path.contains_key(source.path()) {
                report.unchanged += 1;
                continue;
            }
            self.catalog = None;
            self.attach(Rc::clone(source), diagnostics)?;
            report.added.push(source.path().to_path_buf());
        }

        report.removed = departed;
        if !report.is_empty() {
            info!(
                "Synchronized index: {} added, {} removed, {} unchanged in {}ms",
                report.added.len(),
                report.removed.len(),
                report.unchanged,
                start.elapsed().as_millis()
            );
        }

        Ok(report)
    }

    pub fn get_statistics(&self) -> IndexStatistics {
        IndexStatistics {
            tracked_files: self.files.len(),
            total_classes: self.files.iter().map(|f| f.classes().len()).sum(),
            catalog_built: self.catalog.is_some(),
        }
    }
}
