use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use crate::sources::SourceFile;

/// Byte offset range inside one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A span tied to the file it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub start: usize,
    pub end: usize,
    pub file: PathBuf,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.file.display(), self.start, self.end)
    }
}

/// One class registration as found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub extends: Option<String>,
    pub alternate_names: Vec<String>,
    pub aliases: Vec<String>,
    pub tags: Vec<String>,
    pub span: Span,
}

#[derive(Debug)]
pub struct ClassRecord {
    pub name: String,
    pub extends: Option<String>,
    pub alternate_names: Vec<String>,
    pub aliases: Vec<String>,
    pub tags: Vec<String>,
    pub span: Span,
    file: PathBuf,
    owner: Weak<FileSymbols>,
}

impl ClassRecord {
    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn location(&self) -> Location {
        Location {
            start: self.span.start,
            end: self.span.end,
            file: self.file.clone(),
        }
    }

    /// The symbol table this class was extracted into, while it is alive.
    pub fn owner(&self) -> Option<Rc<FileSymbols>> {
        self.owner.upgrade()
    }
}

/// Per-file symbol table.
#[derive(Debug)]
pub struct FileSymbols {
    source: Rc<SourceFile>,
    classes: Vec<Rc<ClassRecord>>,
    class_names: Vec<String>,
    alternate_names: Vec<String>,
    aliases: Vec<String>,
    tags: Vec<String>,
}

impl FileSymbols {
    /// Build the table for `source`, giving each class a back-reference to it.
    pub fn from_registrations(source: Rc<SourceFile>, registrations: Vec<Registration>) -> Rc<Self> {
        Rc::new_cyclic(|owner| {
            let mut class_names = Vec::new();
            let mut alternate_names = Vec::new();
            let mut aliases = Vec::new();
            let mut tags = Vec::new();

            let classes = registrations
                .into_iter()
                .map(|reg| {
                    push_unique(&mut class_names, std::slice::from_ref(&reg.name));
                    push_unique(&mut alternate_names, &reg.alternate_names);
                    push_unique(&mut aliases, &reg.aliases);
                    push_unique(&mut tags, &reg.tags);

                    Rc::new(ClassRecord {
                        name: reg.name,
                        extends: reg.extends,
                        alternate_names: reg.alternate_names,
                        aliases: reg.aliases,
                        tags: reg.tags,
                        span: reg.span,
                        file: source.path().to_path_buf(),
                        owner: owner.clone(),
                    })
                })
                .collect();

            FileSymbols {
                source,
                classes,
                class_names,
                alternate_names,
                aliases,
                tags,
            }
        })
    }

    pub fn path(&self) -> &Path {
        self.source.path()
    }

    pub fn source(&self) -> &Rc<SourceFile> {
        &self.source
    }

    pub fn classes(&self) -> &[Rc<ClassRecord>] {
        &self.classes
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn alternate_names(&self) -> &[String] {
        &self.alternate_names
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Map a span of this file to a full location.
    pub fn at(&self, span: Span) -> Location {
        Location {
            start: span.start,
            end: span.end,
            file: self.path().to_path_buf(),
        }
    }
}

fn push_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(name: &str, aliases: &[&str], start: usize) -> Registration {
        Registration {
            name: name.to_string(),
            extends: None,
            alternate_names: Vec::new(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            tags: Vec::new(),
            span: Span::new(start, start + 10),
        }
    }

    #[test]
    fn test_back_reference_and_location() {
        let source = Rc::new(SourceFile::new("/ws/app/view/Main.js", ""));
        let table = FileSymbols::from_registrations(
            source,
            vec![
                registration("App.view.Main", &["widget.main"], 0),
                registration("App.view.Other", &["widget.main", "widget.other"], 20),
            ],
        );

        let record = &table.classes()[1];
        let owner = record.owner().unwrap();
        assert!(Rc::ptr_eq(&owner, &table));
        assert_eq!(record.location(), table.at(Span::new(20, 30)));
        assert_eq!(table.aliases(), ["widget.main", "widget.other"]);
        assert_eq!(table.class_names(), ["App.view.Main", "App.view.Other"]);
    }

    #[test]
    fn test_location_display() {
        let location = Location {
            start: 4,
            end: 9,
            file: PathBuf::from("/ws/app/Main.js"),
        };
        assert_eq!(location.to_string(), "/ws/app/Main.js:4-9");
    }
}
