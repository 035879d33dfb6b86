use anyhow::{Context, Result};
use blake3::Hasher;
use std::cell::OnceCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};
use tree_sitter::Tree;

use crate::config::Config;
use crate::error::ConfigResult;
use crate::parser::JsParser;
use crate::workspace::{ContextId, ProjectModel};

/// One contributing source file. The syntax tree is parsed on first access
/// and reused afterwards.
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    text: String,
    hash: String,
    tree: OnceCell<Tree>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut hasher = Hasher::new();
        hasher.update(text.as_bytes());

        Self {
            path: path.into(),
            hash: hasher.finalize().to_hex().to_string(),
            text,
            tree: OnceCell::new(),
        }
    }

    pub async fn read(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read file: {:?}", path))?;
        Ok(Self::new(path, text))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// blake3 hash of the file contents.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn is_parsed(&self) -> bool {
        self.tree.get().is_some()
    }

    pub fn syntax(&self, parser: &mut JsParser) -> Result<&Tree> {
        if let Some(tree) = self.tree.get() {
            return Ok(tree);
        }
        let tree = parser.parse(&self.text, &self.path)?;
        Ok(self.tree.get_or_init(|| tree))
    }
}

/// Ordered, duplicate-free collection of source files.
#[derive(Debug, Default)]
pub struct SourceCollection {
    files: Vec<Rc<SourceFile>>,
    paths: HashSet<PathBuf>,
}

impl SourceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `file` unless a file with the same path is already present.
    pub fn push(&mut self, file: Rc<SourceFile>) -> bool {
        if !self.paths.insert(file.path().to_path_buf()) {
            return false;
        }
        self.files.push(file);
        true
    }

    /// Remove exactly this handle.
    pub fn remove(&mut self, file: &Rc<SourceFile>) -> bool {
        let Some(pos) = self.files.iter().position(|f| Rc::ptr_eq(f, file)) else {
            return false;
        };
        let removed = self.files.remove(pos);
        self.paths.remove(removed.path());
        true
    }

    pub fn remove_path(&mut self, path: &Path) -> Option<Rc<SourceFile>> {
        let pos = self.files.iter().position(|f| f.path() == path)?;
        let removed = self.files.remove(pos);
        self.paths.remove(removed.path());
        Some(removed)
    }

    pub fn get(&self, path: &Path) -> Option<&Rc<SourceFile>> {
        self.files.iter().find(|f| f.path() == path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<SourceFile>> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Resolves and reads the files a context contributes.
pub struct SourceLoader {
    extension: String,
}

impl SourceLoader {
    pub fn new(config: &Config) -> Self {
        Self {
            extension: config.sources.extension.clone(),
        }
    }

    /// Classpath files followed by override files, deduplicated by path.
    pub fn resolve(&self, project: &ProjectModel, id: ContextId) -> ConfigResult<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for path in project
            .class_files(id, &self.extension)?
            .into_iter()
            .chain(project.override_files(id, &self.extension)?)
        {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }

        Ok(files)
    }

    /// Resolve the file list, then read every file. Parsing is deferred.
    pub async fn load(&self, project: &ProjectModel, id: ContextId) -> Result<SourceCollection> {
        let start = std::time::Instant::now();
        let paths = self.resolve(project, id)?;

        let mut collection = SourceCollection::new();
        for path in paths {
            let file = SourceFile::read(&path).await?;
            debug!("Loaded source {:?}", path);
            collection.push(Rc::new(file));
        }

        info!(
            "Loaded {} source files for {} in {}ms",
            collection.len(),
            project.get(id).name(),
            start.elapsed().as_millis()
        );
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_tracks_content() {
        let a = SourceFile::new("a.js", "Ext.define('A', {});");
        let b = SourceFile::new("b.js", "Ext.define('A', {});");
        let c = SourceFile::new("c.js", "Ext.define('C', {});");

        assert_eq!(a.hash(), b.hash());
        assert_ne!(a.hash(), c.hash());
    }

    #[test]
    fn test_lazy_parse_is_cached() {
        let mut parser = JsParser::new().unwrap();
        let file = SourceFile::new("a.js", "Ext.define('A', {});");
        assert!(!file.is_parsed());

        let first = file.syntax(&mut parser).unwrap() as *const Tree;
        assert!(file.is_parsed());
        let second = file.syntax(&mut parser).unwrap() as *const Tree;
        assert_eq!(first, second);
    }

    #[test]
    fn test_collection_dedup_and_identity_removal() {
        let mut collection = SourceCollection::new();
        let a = Rc::new(SourceFile::new("/src/a.js", ""));
        let a_again = Rc::new(SourceFile::new("/src/a.js", ""));
        let b = Rc::new(SourceFile::new("/src/b.js", ""));

        assert!(collection.push(Rc::clone(&a)));
        assert!(!collection.push(Rc::clone(&a_again)));
        assert!(collection.push(Rc::clone(&b)));
        assert_eq!(collection.len(), 2);

        assert!(!collection.remove(&a_again));
        assert!(collection.remove(&a));
        assert!(!collection.contains(Path::new("/src/a.js")));
        assert_eq!(collection.iter().next().unwrap().path(), Path::new("/src/b.js"));

        assert!(collection.remove_path(Path::new("/src/b.js")).is_some());
        assert!(collection.is_empty());
    }
}
