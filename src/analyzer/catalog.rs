use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::rc::Rc;

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::parser::symbols::{ClassRecord, FileSymbols};

/// Project-wide class catalog merged from per-file symbol tables.
#[derive(Debug, Default)]
pub struct ClassCatalog {
    classes: BTreeMap<String, Rc<ClassRecord>>,
    alternate_names: HashMap<String, String>,
    aliases: HashMap<String, String>,
    tags: HashMap<String, String>,
}

impl ClassCatalog {
    /// Merge `files` in order. The first registration of a name wins; later
    /// ones are reported as duplicates once per (name, file) pair.
    pub fn build(
        files: &[Rc<FileSymbols>],
        diagnostics: &mut Diagnostics,
        reported: &mut HashSet<(String, PathBuf)>,
    ) -> Self {
        let mut catalog = ClassCatalog::default();

        for file in files {
            for record in file.classes() {
                if let Some(existing) = catalog.classes.get(&record.name) {
                    let key = (record.name.clone(), record.file().to_path_buf());
                    if reported.insert(key) {
                        let code = DiagnosticCode::DuplicateClass;
                        diagnostics.report(
                            code,
                            code.default_severity(),
                            format!(
                                "class {} is already registered in {}",
                                record.name,
                                existing.file().display()
                            ),
                            Some(file.at(record.span)),
                        );
                    }
                    continue;
                }
                catalog.insert(record);
            }
        }

        catalog
    }

    fn insert(&mut self, record: &Rc<ClassRecord>) {
        for name in &record.alternate_names {
            self.alternate_names
                .entry(name.clone())
                .or_insert_with(|| record.name.clone());
        }
        for alias in &record.aliases {
            self.aliases
                .entry(alias.clone())
                .or_insert_with(|| record.name.clone());
        }
        for tag in &record.tags {
            self.tags
                .entry(tag.clone())
                .or_insert_with(|| record.name.clone());
        }
        self.classes.insert(record.name.clone(), Rc::clone(record));
    }

    /// Find a class by its full name.
    pub fn get(&self, name: &str) -> Option<&Rc<ClassRecord>> {
        self.classes.get(name)
    }

    /// Find a class by full name, alternate name, alias or tag, in that order.
    pub fn lookup(&self, key: &str) -> Option<&Rc<ClassRecord>> {
        self.classes.get(key).or_else(|| {
            self.alternate_names
                .get(key)
                .or_else(|| self.aliases.get(key))
                .or_else(|| self.tags.get(key))
                .and_then(|name| self.classes.get(name))
        })
    }

    pub fn by_alias(&self, alias: &str) -> Option<&Rc<ClassRecord>> {
        self.aliases.get(alias).and_then(|name| self.classes.get(name))
    }

    pub fn by_tag(&self, tag: &str) -> Option<&Rc<ClassRecord>> {
        self.tags.get(tag).and_then(|name| self.classes.get(name))
    }

    /// Classes sorted by name.
    pub fn items(&self) -> Vec<&Rc<ClassRecord>> {
        self.classes.values().collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            total_classes: self.classes.len(),
            total_alternate_names: self.alternate_names.len(),
            total_aliases: self.aliases.len(),
            total_tags: self.tags.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_classes: usize,
    pub total_alternate_names: usize,
    pub total_aliases: usize,
    pub total_tags: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::symbols::{Registration, Span};
    use crate::sources::SourceFile;

    fn table(path: &str, classes: &[(&str, Option<&str>)]) -> Rc<FileSymbols> {
        let registrations = classes
            .iter()
            .enumerate()
            .map(|(i, (name, alias))| Registration {
                name: name.to_string(),
                extends: None,
                alternate_names: Vec::new(),
                aliases: alias.iter().map(|a| a.to_string()).collect(),
                tags: vec![name.rsplit('.').next().unwrap().to_lowercase()],
                span: Span::new(i * 100, i * 100 + 50),
            })
            .collect();
        FileSymbols::from_registrations(Rc::new(SourceFile::new(path, "")), registrations)
    }

    #[test]
    fn test_sorted_items_and_lookup() {
        let files = vec![
            table("/ws/app/b.js", &[("App.view.Zeta", Some("widget.zeta"))]),
            table("/ws/app/a.js", &[("App.view.Alpha", Some("widget.alpha"))]),
        ];
        let mut diagnostics = Diagnostics::new();
        let catalog = ClassCatalog::build(&files, &mut diagnostics, &mut HashSet::new());

        let names: Vec<&str> = catalog.names().collect();
        assert_eq!(names, vec!["App.view.Alpha", "App.view.Zeta"]);

        let by_name = catalog.get("App.view.Zeta").unwrap();
        let by_alias = catalog.lookup("widget.zeta").unwrap();
        assert!(Rc::ptr_eq(by_name, by_alias));
        assert!(Rc::ptr_eq(by_name, catalog.by_tag("zeta").unwrap()));
        assert!(Rc::ptr_eq(by_name, &files[0].classes()[0]));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_duplicate_reported_once() {
        let files = vec![
            table("/ws/app/first.js", &[("App.Dup", None)]),
            table("/ws/app/second.js", &[("App.Dup", None)]),
        ];
        let mut diagnostics = Diagnostics::new();
        let mut reported = HashSet::new();

        let catalog = ClassCatalog::build(&files, &mut diagnostics, &mut reported);
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get("App.Dup").unwrap().file(),
            std::path::Path::new("/ws/app/first.js")
        );
        assert_eq!(diagnostics.count(DiagnosticCode::DuplicateClass), 1);

        ClassCatalog::build(&files, &mut diagnostics, &mut reported);
        assert_eq!(diagnostics.count(DiagnosticCode::DuplicateClass), 1);
    }
}
