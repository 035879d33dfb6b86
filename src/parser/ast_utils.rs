use tree_sitter::Node;

/// Safe wrapper around node.utf8_text that handles encoding errors gracefully
pub fn safe_node_text<'a>(node: Node, source: &'a [u8]) -> Option<&'a str> {
    node.utf8_text(source).ok()
}

/// Named children, skipping comments.
pub fn significant_children<'a>(node: Node<'a>) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Callee text with whitespace removed, e.g. `Ext . define` -> `Ext.define`.
pub fn callee_path(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" | "member_expression" => safe_node_text(node, source)
            .map(|text| text.chars().filter(|c| !c.is_whitespace()).collect()),
        _ => None,
    }
}

/// Value of a string literal, with simple escapes resolved.
pub fn string_literal_value(node: Node, source: &[u8]) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }

    let mut value = String::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        let text = safe_node_text(child, source)?;
        match child.kind() {
            "string_fragment" => value.push_str(text),
            "escape_sequence" => match text.chars().nth(1) {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some(c) => value.push(c),
                None => {}
            },
            _ => {}
        }
    }
    Some(value)
}

/// A string literal or an array of string literals, as a list.
pub fn string_list(node: Node, source: &[u8]) -> Vec<String> {
    match node.kind() {
        "string" => string_literal_value(node, source).into_iter().collect(),
        "array" => significant_children(node)
            .into_iter()
            .filter_map(|item| string_literal_value(item, source))
            .collect(),
        _ => Vec::new(),
    }
}

/// Key of an object `pair` as plain text.
pub fn pair_key(pair: Node, source: &[u8]) -> Option<String> {
    let key = pair.child_by_field_name("key")?;
    match key.kind() {
        "property_identifier" => safe_node_text(key, source).map(String::from),
        "string" => string_literal_value(key, source),
        _ => None,
    }
}

/// Value node of the first `pair` named `key` in an object literal.
pub fn object_value<'a>(object: Node<'a>, key: &str, source: &[u8]) -> Option<Node<'a>> {
    significant_children(object)
        .into_iter()
        .filter(|child| child.kind() == "pair")
        .find(|pair| pair_key(*pair, source).as_deref() == Some(key))
        .and_then(|pair| pair.child_by_field_name("value"))
}

fn unwrap_parens(mut node: Node) -> Node {
    while node.kind() == "parenthesized_expression" {
        match significant_children(node).into_iter().next() {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// The object literal a registration body evaluates to: the node itself, or
/// the object a factory function returns.
pub fn body_object(node: Node) -> Option<Node> {
    let node = unwrap_parens(node);
    match node.kind() {
        "object" => Some(node),
        "function_expression" | "function" | "arrow_function" => {
            let body = unwrap_parens(node.child_by_field_name("body")?);
            match body.kind() {
                "object" => Some(body),
                "statement_block" => significant_children(body)
                    .into_iter()
                    .filter(|stmt| stmt.kind() == "return_statement")
                    .find_map(|ret| {
                        significant_children(ret)
                            .into_iter()
                            .next()
                            .map(unwrap_parens)
                            .filter(|value| value.kind() == "object")
                    }),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Comments directly preceding the statement that contains `node`, in
/// source order.
pub fn leading_comments<'a>(node: Node, source: &'a [u8]) -> Vec<&'a str> {
    let statement = match node.parent() {
        Some(parent) if parent.kind() == "expression_statement" => parent,
        _ => node,
    };

    let mut comments = Vec::new();
    let mut current = statement.prev_sibling();
    while let Some(sibling) = current {
        if sibling.kind() != "comment" {
            break;
        }
        if let Some(text) = safe_node_text(sibling, source) {
            comments.push(text);
        }
        current = sibling.prev_sibling();
    }

    comments.reverse();
    comments
}

/// First error or missing node in document order, if the tree needed recovery.
pub fn first_error_node(root: Node) -> Option<Node> {
    if !root.has_error() {
        return None;
    }

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}
