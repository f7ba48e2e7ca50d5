//! Python symbol/reference extraction over the `tree-sitter-python` grammar.

use roam_store::domain::{EdgeKind, SymbolKind, Visibility};
use tree_sitter::{Node, Tree};

use super::util::{child_text, end_line, node_text, start_line};
use super::{ExtractedSymbol, LanguageExtractor, RawReference};

pub struct PythonExtractor;

fn visibility_of(name: &str) -> (Visibility, bool) {
    if name.starts_with("__") && name.ends_with("__") {
        (Visibility::Public, true)
    } else if name.starts_with('_') {
        (Visibility::Private, false)
    } else {
        (Visibility::Public, true)
    }
}

fn docstring_of(body: Node, source: &str) -> Option<String> {
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = first.named_child(0)?;
    if expr.kind() != "string" {
        return None;
    }
    let text = node_text(expr, source);
    Some(
        text.trim_matches(|c| c == '"' || c == '\'')
            .trim()
            .to_string(),
    )
}

fn walk_symbols(node: Node, source: &str, parent: Option<&str>, out: &mut Vec<ExtractedSymbol>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_definition" => {
                if let Some(name) = child_text(child, "name", source) {
                    let (visibility, exported) = visibility_of(name);
                    let qualified = match parent {
                        Some(p) => format!("{p}.{name}"),
                        None => name.to_string(),
                    };
                    out.push(ExtractedSymbol {
                        name: name.to_string(),
                        qualified_name: qualified,
                        kind: if parent.is_some() {
                            SymbolKind::Method
                        } else {
                            SymbolKind::Function
                        },
                        signature: child
                            .child_by_field_name("parameters")
                            .map(|n| node_text(n, source).to_string()),
                        line_start: start_line(child),
                        line_end: end_line(child),
                        docstring: child
                            .child_by_field_name("body")
                            .and_then(|b| docstring_of(b, source)),
                        visibility,
                        is_exported: exported,
                        parent_name: parent.map(|p| p.to_string()),
                        default_value: None,
                    });
                }
            }
            "class_definition" => {
                if let Some(name) = child_text(child, "name", source) {
                    let (visibility, exported) = visibility_of(name);
                    out.push(ExtractedSymbol {
                        name: name.to_string(),
                        qualified_name: match parent {
                            Some(p) => format!("{p}.{name}"),
                            None => name.to_string(),
                        },
                        kind: SymbolKind::Class,
                        signature: child
                            .child_by_field_name("superclasses")
                            .map(|n| node_text(n, source).to_string()),
                        line_start: start_line(child),
                        line_end: end_line(child),
                        docstring: child
                            .child_by_field_name("body")
                            .and_then(|b| docstring_of(b, source)),
                        visibility,
                        is_exported: exported,
                        parent_name: parent.map(|p| p.to_string()),
                        default_value: None,
                    });
                    if let Some(body) = child.child_by_field_name("body") {
                        walk_symbols(body, source, Some(name), out);
                    }
                    continue; // don't double-descend below
                }
            }
            "assignment" if parent.is_none() => {
                if let Some(target) = child.child_by_field_name("left") {
                    if target.kind() == "identifier" {
                        let name = node_text(target, source);
                        if name.chars().all(|c| c.is_uppercase() || c == '_' || c.is_numeric()) {
                            let (visibility, exported) = visibility_of(name);
                            out.push(ExtractedSymbol {
                                name: name.to_string(),
                                qualified_name: name.to_string(),
                                kind: SymbolKind::Constant,
                                signature: None,
                                line_start: start_line(child),
                                line_end: end_line(child),
                                docstring: None,
                                visibility,
                                is_exported: exported,
                                parent_name: None,
                                default_value: child
                                    .child_by_field_name("right")
                                    .map(|n| node_text(n, source).to_string()),
                            });
                        }
                    }
                }
            }
            _ => {}
        }
        walk_symbols(child, source, parent, out);
    }
}

fn walk_references(
    node: Node,
    source: &str,
    file_path: &str,
    scope: Option<&str>,
    out: &mut Vec<RawReference>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let mut child_scope = scope.map(|s| s.to_string());
        match child.kind() {
            "function_definition" => {
                if let Some(name) = child_text(child, "name", source) {
                    child_scope = Some(name.to_string());
                }
            }
            "call" => {
                if let Some(func) = child.child_by_field_name("function") {
                    let name = match func.kind() {
                        "identifier" => Some(node_text(func, source).to_string()),
                        "attribute" => func
                            .child_by_field_name("attribute")
                            .map(|a| node_text(a, source).to_string()),
                        _ => None,
                    };
                    if let Some(target_name) = name {
                        out.push(RawReference {
                            source_name: scope.map(|s| s.to_string()),
                            target_name,
                            kind: EdgeKind::Call,
                            line: start_line(child),
                            source_file: file_path.to_string(),
                        });
                    }
                }
            }
            "import_statement" | "import_from_statement" => {
                for name in dotted_names(child, source) {
                    out.push(RawReference {
                        source_name: None,
                        target_name: name,
                        kind: EdgeKind::Import,
                        line: start_line(child),
                        source_file: file_path.to_string(),
                    });
                }
            }
            "class_definition" => {
                if let Some(bases) = child.child_by_field_name("superclasses") {
                    for name in dotted_names(bases, source) {
                        out.push(RawReference {
                            source_name: child_text(child, "name", source).map(|s| s.to_string()),
                            target_name: name,
                            kind: EdgeKind::Inherits,
                            line: start_line(child),
                            source_file: file_path.to_string(),
                        });
                    }
                }
            }
            _ => {}
        }
        walk_references(child, source, file_path, child_scope.as_deref(), out);
    }
}

fn dotted_names(node: Node, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    match node.kind() {
        "dotted_name" | "identifier" => out.push(node_text(node, source).to_string()),
        "aliased_import" => {
            if let Some(n) = node.child_by_field_name("name") {
                out.extend(dotted_names(n, source));
            }
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                out.extend(dotted_names(child, source));
            }
        }
    }
    out
}

impl LanguageExtractor for PythonExtractor {
    fn extract_symbols(&self, tree: &Tree, source: &str, _file_path: &str) -> Vec<ExtractedSymbol> {
        let mut out = Vec::new();
        walk_symbols(tree.root_node(), source, None, &mut out);
        out
    }

    fn extract_references(&self, tree: &Tree, source: &str, file_path: &str) -> Vec<RawReference> {
        let mut out = Vec::new();
        walk_references(tree.root_node(), source, file_path, None, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Tree {
        crate::features::parsing::parse(roam_store::domain::Language::Python, src)
            .tree
            .expect("python source should parse")
    }

    #[test]
    fn extracts_function_and_class_with_method() {
        let src = "class Greeter:\n    def hello(self):\n        return 1\n\ndef top():\n    pass\n";
        let tree = parse(src);
        let symbols = PythonExtractor.extract_symbols(&tree, src, "a.py");
        assert!(symbols.iter().any(|s| s.name == "Greeter" && s.kind == SymbolKind::Class));
        let hello = symbols.iter().find(|s| s.name == "hello").unwrap();
        assert_eq!(hello.kind, SymbolKind::Method);
        assert_eq!(hello.qualified_name, "Greeter.hello");
        assert!(symbols.iter().any(|s| s.name == "top" && s.kind == SymbolKind::Function));
    }

    #[test]
    fn leading_underscore_name_is_private() {
        let src = "def _helper():\n    pass\n";
        let tree = parse(src);
        let symbols = PythonExtractor.extract_symbols(&tree, src, "a.py");
        assert_eq!(symbols[0].visibility, Visibility::Private);
        assert!(!symbols[0].is_exported);
    }

    #[test]
    fn import_produces_import_reference() {
        let src = "import os\nfrom collections import OrderedDict\n";
        let tree = parse(src);
        let refs = PythonExtractor.extract_references(&tree, src, "a.py");
        assert!(refs.iter().any(|r| r.target_name == "os"));
        assert!(refs.iter().any(|r| r.target_name == "OrderedDict"));
    }
}
