use anyhow::Result;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tree_sitter::{Node, Parser, Tree};

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::parser::ast_utils::*;
use crate::parser::symbols::{Location, Registration, Span};

static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(alternateClassName|alias|xtype)\s+([\w$.\-]+)").expect("annotation pattern is valid")
});

pub struct JsParser {
    parser: Parser,
}

impl JsParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .map_err(|e| anyhow::anyhow!("Failed to set language: {}", e))?;

        Ok(Self { parser })
    }

    /// Parse `source`. Syntax errors are recovered into ERROR nodes.
    pub fn parse(&mut self, source: &str, file_path: &Path) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("Failed to parse source for: {}", file_path.display()))
    }
}

/// Finds class-registration calls in a syntax tree.
pub struct RegistrationScanner<'a> {
    functions: &'a [String],
    file_path: &'a Path,
    source: &'a [u8],
}

impl<'a> RegistrationScanner<'a> {
    pub fn new(functions: &'a [String], file_path: &'a Path, source: &'a str) -> Self {
        Self {
            functions,
            file_path,
            source: source.as_bytes(),
        }
    }

    /// Scan the whole tree in document order. Malformed registrations are
    /// reported and skipped.
    pub fn scan(&self, tree: &Tree, diagnostics: &mut Diagnostics) -> Vec<Registration> {
        let mut registrations = Vec::new();
        let mut stack = vec![tree.root_node()];

        while let Some(node) = stack.pop() {
            if node.kind() == "call_expression" && self.is_registration_call(node) {
                if let Some(registration) = self.extract(node, diagnostics) {
                    registrations.push(registration);
                }
            }

            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        registrations
    }

    fn is_registration_call(&self, call: Node) -> bool {
        call.child_by_field_name("function")
            .and_then(|callee| callee_path(callee, self.source))
            .map(|callee| self.functions.iter().any(|f| *f == callee))
            .unwrap_or(false)
    }

    fn location(&self, node: Node) -> Location {
        Location {
            start: node.start_byte(),
            end: node.end_byte(),
            file: self.file_path.to_path_buf(),
        }
    }

    fn malformed(&self, call: Node, message: String, diagnostics: &mut Diagnostics) {
        let code = DiagnosticCode::RegistrationShape;
        diagnostics.report(code, code.default_severity(), message, Some(self.location(call)));
    }

    fn extract(&self, call: Node, diagnostics: &mut Diagnostics) -> Option<Registration> {
        let callee = call
            .child_by_field_name("function")
            .and_then(|f| callee_path(f, self.source))
            .unwrap_or_default();
        let args = call
            .child_by_field_name("arguments")
            .map(significant_children)
            .unwrap_or_default();

        if args.len() < 2 || args.len() > 3 {
            self.malformed(
                call,
                format!(
                    "`{}` expects a class name and a class body, found {} argument(s)",
                    callee,
                    args.len()
                ),
                diagnostics,
            );
            return None;
        }

        let Some(name) = string_literal_value(args[0], self.source) else {
            self.malformed(
                call,
                format!("first argument of `{}` must be a class name string", callee),
                diagnostics,
            );
            return None;
        };

        let Some(body) = body_object(args[1]) else {
            self.malformed(
                call,
                format!(
                    "second argument of `{}` for {} must be an object literal or a function returning one",
                    callee, name
                ),
                diagnostics,
            );
            return None;
        };

        let mut registration = Registration {
            name,
            extends: object_value(body, "extend", self.source)
                .and_then(|value| string_literal_value(value, self.source)),
            alternate_names: Vec::new(),
            aliases: Vec::new(),
            tags: Vec::new(),
            span: Span::new(call.start_byte(), call.end_byte()),
        };

        // Annotations come first: they precede the call in the source.
        for comment in leading_comments(call, self.source) {
            for caps in ANNOTATION.captures_iter(comment) {
                let target = match &caps[1] {
                    "alternateClassName" => &mut registration.alternate_names,
                    "alias" => &mut registration.aliases,
                    _ => &mut registration.tags,
                };
                push_unique(target, caps[2].to_string());
            }
        }

        for (key, target) in [
            ("alternateClassName", &mut registration.alternate_names),
            ("alias", &mut registration.aliases),
            ("xtype", &mut registration.tags),
        ] {
            if let Some(value) = object_value(body, key, self.source) {
                for item in string_list(value, self.source) {
                    push_unique(target, item);
                }
            }
        }

        Some(registration)
    }
}

fn push_unique(target: &mut Vec<String>, item: String) {
    if !target.contains(&item) {
        target.push(item);
    }
}

/// Parse `source` and extract its registrations, reporting malformed calls
/// and syntax recovery into `diagnostics`.
pub fn extract_registrations(
    parser: &mut JsParser,
    source: &str,
    file_path: &Path,
    functions: &[String],
    diagnostics: &mut Diagnostics,
) -> Result<Vec<Registration>> {
    let tree = parser.parse(source, file_path)?;
    report_syntax_errors(&tree, file_path, diagnostics);
    Ok(RegistrationScanner::new(functions, file_path, source).scan(&tree, diagnostics))
}

pub fn report_syntax_errors(tree: &Tree, file_path: &Path, diagnostics: &mut Diagnostics) {
    if let Some(error) = first_error_node(tree.root_node()) {
        let code = DiagnosticCode::SyntaxError;
        let position = error.start_position();
        diagnostics.report(
            code,
            code.default_severity(),
            format!(
                "syntax error at line {}, column {}; extraction continues on the recovered tree",
                position.row + 1,
                position.column + 1
            ),
            Some(Location {
                start: error.start_byte(),
                end: error.end_byte(),
                file: file_path.to_path_buf(),
            }),
        );
    }
}
