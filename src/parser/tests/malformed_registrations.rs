use crate::diagnostics::{DiagnosticCode, Diagnostics, Severity};
use crate::parser::tests::fixtures::*;
use crate::parser::{extract_registrations, JsParser};
use std::path::Path;

fn scan(source: &str, diagnostics: &mut Diagnostics) -> Vec<String> {
    let mut parser = JsParser::new().expect("Failed to create parser");
    let functions = vec!["Ext.define".to_string()];
    extract_registrations(&mut parser, source, Path::new("bad.js"), &functions, diagnostics)
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect()
}

#[test]
pub fn test_malformed_calls_are_skipped() {
    let mut diagnostics = Diagnostics::new();
    let names = scan(MALFORMED_REGISTRATIONS, &mut diagnostics);

    assert_eq!(names, vec!["MyApp.Valid"]);
    assert_eq!(diagnostics.count(DiagnosticCode::RegistrationShape), 3);

    for diagnostic in diagnostics.all() {
        assert_eq!(diagnostic.severity, Severity::Warn);
        let location = diagnostic.location.as_ref().expect("Diagnostic should carry a location");
        assert_eq!(location.file, Path::new("bad.js"));
        assert!(MALFORMED_REGISTRATIONS[location.start..location.end].starts_with("Ext.define("));
    }
}

#[test]
pub fn test_too_many_arguments() {
    let mut diagnostics = Diagnostics::new();
    let names = scan(TOO_MANY_ARGUMENTS, &mut diagnostics);

    assert!(names.is_empty());
    assert_eq!(diagnostics.count(DiagnosticCode::RegistrationShape), 1);
    assert!(diagnostics.all()[0].message.contains("4 argument"));
}

#[test]
pub fn test_syntax_error_recovered() {
    let mut diagnostics = Diagnostics::new();
    let names = scan(BROKEN_SYNTAX, &mut diagnostics);

    assert!(names.iter().any(|n| n == "MyApp.BeforeError"));
    assert_eq!(diagnostics.count(DiagnosticCode::SyntaxError), 1);
    // Info sits below the default warn threshold.
    assert_eq!(diagnostics.surfaced().count(), 0);
}
