use crate::diagnostics::Diagnostics;
use crate::parser::tests::fixtures::ANNOTATED_REGISTRATION;
use crate::parser::{extract_registrations, JsParser};
use std::path::Path;

/// Doc-comment annotations merge with the object config; annotation values
/// come first and duplicates collapse.
#[test]
pub fn test_annotation_parsing() {
    let mut parser = JsParser::new().expect("Failed to create parser");
    let mut diagnostics = Diagnostics::new();
    let functions = vec!["Ext.define".to_string()];

    let registrations = extract_registrations(
        &mut parser,
        ANNOTATED_REGISTRATION,
        Path::new("Toolbar.js"),
        &functions,
        &mut diagnostics,
    )
    .unwrap();

    assert_eq!(registrations.len(), 1);
    let toolbar = &registrations[0];
    assert_eq!(toolbar.name, "MyApp.view.Toolbar");
    assert_eq!(toolbar.alternate_names, vec!["MyApp.Toolbar"]);
    assert_eq!(toolbar.tags, vec!["apptoolbar"]);
    assert_eq!(toolbar.aliases, vec!["widget.apptoolbar"]);
}

#[test]
pub fn test_unrelated_comment_ignored() {
    let source = r#"
// @alias widget.stray
var x = 1;
Ext.define('MyApp.Plain', {});
"#;
    let mut parser = JsParser::new().unwrap();
    let mut diagnostics = Diagnostics::new();
    let functions = vec!["Ext.define".to_string()];

    let registrations =
        extract_registrations(&mut parser, source, Path::new("plain.js"), &functions, &mut diagnostics).unwrap();

    assert_eq!(registrations.len(), 1);
    assert!(registrations[0].aliases.is_empty(), "Comment is not attached to the call");
}
