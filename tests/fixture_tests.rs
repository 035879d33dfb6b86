use ext_workspace_analyzer::diagnostics::{DiagnosticCode, Diagnostics};
use ext_workspace_analyzer::parser::{extract_registrations, JsParser, Registration};
use ext_workspace_analyzer::sources::{SourceCollection, SourceFile};
use ext_workspace_analyzer::{Config, SymbolIndex};
use std::path::{Path, PathBuf};
use std::rc::Rc;

// Import the fixture constants
include!("../src/parser/tests/fixtures/registration_patterns.rs");

fn parse(source: &str) -> (Vec<Registration>, Diagnostics) {
    let mut parser = JsParser::new().unwrap();
    let mut diagnostics = Diagnostics::new();
    let functions = vec!["Ext.define".to_string()];
    let registrations =
        extract_registrations(&mut parser, source, &PathBuf::from("test.js"), &functions, &mut diagnostics).unwrap();
    (registrations, diagnostics)
}

#[test]
fn test_simple_registration() {
    let (registrations, _) = parse(SIMPLE_REGISTRATION);

    assert_eq!(registrations.len(), 1, "Should find MyApp.view.Main");
    assert_eq!(registrations[0].name, "MyApp.view.Main");
}

#[test]
fn test_factory_shapes() {
    for source in [FACTORY_FUNCTION, ARROW_FACTORY] {
        let (registrations, diagnostics) = parse(source);
        assert_eq!(registrations.len(), 1, "Factory body should be recognized");
        assert!(diagnostics.is_empty());
    }
}

#[test]
fn test_malformed_fixture_counts() {
    let (registrations, diagnostics) = parse(MALFORMED_REGISTRATIONS);

    assert_eq!(registrations.len(), 1);
    assert_eq!(diagnostics.count(DiagnosticCode::RegistrationShape), 3);
    assert_eq!(diagnostics.surfaced().count(), 3);
}

/// Every fixture at once: files, classes and malformed counts line up.
#[test]
fn test_index_over_all_fixtures() {
    let fixtures = [
        ("Simple.js", SIMPLE_REGISTRATION, 1usize, 0usize),
        ("Lists.js", LIST_CONFIGS, 1, 0),
        ("Factory.js", FACTORY_FUNCTION, 1, 0),
        ("Arrow.js", ARROW_FACTORY, 1, 0),
        ("Annotated.js", ANNOTATED_REGISTRATION, 1, 0),
        ("Callback.js", CALLBACK_ARGUMENT, 1, 0),
        ("Malformed.js", MALFORMED_REGISTRATIONS, 4, 3),
        ("Crowded.js", TOO_MANY_ARGUMENTS, 1, 1),
        ("Nested.js", NESTED_REGISTRATIONS, 2, 0),
    ];

    let mut sources = SourceCollection::new();
    for (name, text, _, _) in &fixtures {
        sources.push(Rc::new(SourceFile::new(Path::new("/fixtures").join(name), *text)));
    }
    let occurrences: usize = fixtures.iter().map(|f| f.2).sum();
    let malformed: usize = fixtures.iter().map(|f| f.3).sum();

    let mut diagnostics = Diagnostics::new();
    let mut index = SymbolIndex::new(&Config::default(), &sources, &mut diagnostics).unwrap();

    assert_eq!(index.files().len(), fixtures.len());
    assert_eq!(index.classes(&mut diagnostics).len(), occurrences - malformed);
    assert_eq!(diagnostics.count(DiagnosticCode::RegistrationShape), malformed);
    assert_eq!(diagnostics.count(DiagnosticCode::DuplicateClass), 0);

    let catalog = index.classes(&mut diagnostics);
    let toolbar = catalog.lookup("apptoolbar").unwrap();
    assert_eq!(toolbar.name, "MyApp.view.Toolbar");
    assert!(Rc::ptr_eq(toolbar, catalog.lookup("MyApp.Toolbar").unwrap()));
    assert_eq!(toolbar.owner().unwrap().path(), Path::new("/fixtures/Annotated.js"));
    assert_eq!(catalog.stats().total_classes, occurrences - malformed);

    let stats = index.get_statistics();
    assert!(stats.catalog_built);
    assert_eq!(stats.tracked_files, fixtures.len());
}
