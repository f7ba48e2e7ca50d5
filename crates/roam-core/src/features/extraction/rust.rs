//! Rust symbol/reference extraction over the `tree-sitter-rust` grammar.

use roam_store::domain::{EdgeKind, SymbolKind, Visibility};
use tree_sitter::{Node, Tree};

use super::util::{child_text, end_line, node_text, start_line};
use super::{ExtractedSymbol, LanguageExtractor, RawReference};

pub struct RustExtractor;

fn is_pub(node: Node, source: &str) -> bool {
    node.children(&mut node.walk())
        .any(|c| c.kind() == "visibility_modifier" && node_text(c, source).starts_with("pub"))
}

fn docstring_above(node: Node, source: &str) -> Option<String> {
    let mut lines = Vec::new();
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if s.kind() == "line_comment" {
            let text = node_text(s, source);
            if let Some(doc) = text.strip_prefix("///").or_else(|| text.strip_prefix("//!")) {
                lines.push(doc.trim().to_string());
                sibling = s.prev_sibling();
                continue;
            }
        }
        break;
    }
    if lines.is_empty() {
        None
    } else {
        lines.reverse();
        Some(lines.join("\n"))
    }
}

fn walk_symbols(
    node: Node,
    source: &str,
    parent: Option<&str>,
    out: &mut Vec<ExtractedSymbol>,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_item" => {
                if let Some(name) = child_text(child, "name", source) {
                    let qualified = match parent {
                        Some(p) => format!("{p}::{name}"),
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
                        docstring: docstring_above(child, source),
                        visibility: if is_pub(child, source) {
                            Visibility::Public
                        } else {
                            Visibility::Private
                        },
                        is_exported: is_pub(child, source),
                        parent_name: parent.map(|p| p.to_string()),
                        default_value: None,
                    });
                }
            }
            "struct_item" | "enum_item" | "trait_item" | "union_item" => {
                if let Some(name) = child_text(child, "name", source) {
                    let kind = match child.kind() {
                        "struct_item" => SymbolKind::Struct,
                        "enum_item" => SymbolKind::Enum,
                        "trait_item" => SymbolKind::Trait,
                        _ => SymbolKind::Struct,
                    };
                    out.push(ExtractedSymbol {
                        name: name.to_string(),
                        qualified_name: match parent {
                            Some(p) => format!("{p}::{name}"),
                            None => name.to_string(),
                        },
                        kind,
                        signature: None,
                        line_start: start_line(child),
                        line_end: end_line(child),
                        docstring: docstring_above(child, source),
                        visibility: if is_pub(child, source) {
                            Visibility::Public
                        } else {
                            Visibility::Private
                        },
                        is_exported: is_pub(child, source),
                        parent_name: parent.map(|p| p.to_string()),
                        default_value: None,
                    });
                    if child.kind() == "trait_item" {
                        if let Some(body) = child.child_by_field_name("body") {
                            walk_symbols(body, source, Some(name), out);
                        }
                    }
                }
            }
            "mod_item" => {
                if let Some(name) = child_text(child, "name", source) {
                    out.push(ExtractedSymbol {
                        name: name.to_string(),
                        qualified_name: match parent {
                            Some(p) => format!("{p}::{name}"),
                            None => name.to_string(),
                        },
                        kind: SymbolKind::Module,
                        signature: None,
                        line_start: start_line(child),
                        line_end: end_line(child),
                        docstring: docstring_above(child, source),
                        visibility: if is_pub(child, source) {
                            Visibility::Public
                        } else {
                            Visibility::Private
                        },
                        is_exported: is_pub(child, source),
                        parent_name: parent.map(|p| p.to_string()),
                        default_value: None,
                    });
                    if let Some(body) = child.child_by_field_name("body") {
                        walk_symbols(body, source, Some(name), out);
                    }
                }
            }
            "const_item" | "static_item" => {
                if let Some(name) = child_text(child, "name", source) {
                    out.push(ExtractedSymbol {
                        name: name.to_string(),
                        qualified_name: match parent {
                            Some(p) => format!("{p}::{name}"),
                            None => name.to_string(),
                        },
                        kind: SymbolKind::Constant,
                        signature: child
                            .child_by_field_name("type")
                            .map(|n| node_text(n, source).to_string()),
                        line_start: start_line(child),
                        line_end: end_line(child),
                        docstring: docstring_above(child, source),
                        visibility: if is_pub(child, source) {
                            Visibility::Public
                        } else {
                            Visibility::Private
                        },
                        is_exported: is_pub(child, source),
                        parent_name: parent.map(|p| p.to_string()),
                        default_value: child
                            .child_by_field_name("value")
                            .map(|n| node_text(n, source).to_string()),
                    });
                }
            }
            "impl_item" => {
                // Methods attach to the type name, not a synthetic "impl"
                // symbol; spec only models file-scoped parent_id, so the
                // type is the qualifying parent for its impl'd methods.
                let type_name = child
                    .child_by_field_name("type")
                    .map(|n| node_text(n, source));
                if let (Some(body), Some(type_name)) = (child.child_by_field_name("body"), type_name)
                {
                    walk_symbols(body, source, Some(type_name), out);
                }
            }
            _ => {}
        }
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
            "function_item" | "struct_item" | "union_item" => {
                if let Some(name) = child_text(child, "name", source) {
                    child_scope = Some(name.to_string());
                }
            }
            "call_expression" => {
                if let Some(func) = child.child_by_field_name("function") {
                    let name = match func.kind() {
                        "identifier" => Some(node_text(func, source).to_string()),
                        "field_expression" => func
                            .child_by_field_name("field")
                            .map(|f| node_text(f, source).to_string()),
                        "scoped_identifier" => func
                            .child_by_field_name("name")
                            .map(|f| node_text(f, source).to_string()),
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
            "use_declaration" => {
                if let Some(arg) = child.child_by_field_name("argument") {
                    for name in leaf_identifiers(arg, source) {
                        out.push(RawReference {
                            source_name: None,
                            target_name: name,
                            kind: EdgeKind::Import,
                            line: start_line(child),
                            source_file: file_path.to_string(),
                        });
                    }
                }
            }
            "trait_bounds" | "generic_type" => {
                for name in leaf_type_identifiers(child, source) {
                    out.push(RawReference {
                        source_name: scope.map(|s| s.to_string()),
                        target_name: name,
                        kind: EdgeKind::UsesTrait,
                        line: start_line(child),
                        source_file: file_path.to_string(),
                    });
                }
            }
            "field_declaration" => {
                if let Some(ty) = child.child_by_field_name("type") {
                    for name in leaf_type_identifiers(ty, source) {
                        out.push(RawReference {
                            source_name: scope.map(|s| s.to_string()),
                            target_name: name,
                            kind: EdgeKind::Uses,
                            line: start_line(child),
                            source_file: file_path.to_string(),
                        });
                    }
                }
            }
            "impl_item" => {
                if let (Some(trait_node), Some(type_node)) = (
                    child.child_by_field_name("trait"),
                    child.child_by_field_name("type"),
                ) {
                    for name in leaf_type_identifiers(trait_node, source) {
                        out.push(RawReference {
                            source_name: Some(node_text(type_node, source).to_string()),
                            target_name: name,
                            kind: EdgeKind::Implements,
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

fn leaf_identifiers(node: Node, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    if node.kind() == "identifier" || node.kind() == "type_identifier" {
        out.push(node_text(node, source).to_string());
        return out;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        out.extend(leaf_identifiers(child, source));
    }
    out
}

fn leaf_type_identifiers(node: Node, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    if node.kind() == "type_identifier" {
        out.push(node_text(node, source).to_string());
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        out.extend(leaf_type_identifiers(child, source));
    }
    out
}

impl LanguageExtractor for RustExtractor {
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
    use crate::features::parsing;

    fn parse(src: &str) -> Tree {
        parsing::parse(roam_store::domain::Language::Rust, src)
            .tree
            .expect("rust source should parse")
    }

    #[test]
    fn extracts_top_level_function() {
        let tree = parse("pub fn greet(name: &str) -> String { name.to_string() }");
        let symbols = RustExtractor.extract_symbols(&tree, "pub fn greet(name: &str) -> String { name.to_string() }", "a.rs");
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "greet");
        assert_eq!(symbols[0].kind, SymbolKind::Function);
        assert!(symbols[0].is_exported);
    }

    #[test]
    fn methods_inside_impl_qualify_under_type_name() {
        let src = "struct Foo;\nimpl Foo {\n    pub fn bar(&self) {}\n}\n";
        let tree = parse(src);
        let symbols = RustExtractor.extract_symbols(&tree, src, "a.rs");
        let bar = symbols.iter().find(|s| s.name == "bar").unwrap();
        assert_eq!(bar.kind, SymbolKind::Method);
        assert_eq!(bar.qualified_name, "Foo::bar");
        assert_eq!(bar.parent_name.as_deref(), Some("Foo"));
    }

    #[test]
    fn call_expression_produces_call_reference() {
        let src = "fn a() { b(); }\nfn b() {}\n";
        let tree = parse(src);
        let refs = RustExtractor.extract_references(&tree, src, "a.rs");
        assert!(refs.iter().any(|r| r.target_name == "b" && r.kind == EdgeKind::Call));
    }

    #[test]
    fn use_declaration_produces_import_reference() {
        let src = "use std::collections::HashMap;\nfn f() {}\n";
        let tree = parse(src);
        let refs = RustExtractor.extract_references(&tree, src, "a.rs");
        assert!(refs.iter().any(|r| r.target_name == "HashMap" && r.kind == EdgeKind::Import));
    }

    #[test]
    fn struct_field_type_produces_uses_reference() {
        let src = "struct Engine;\nstruct Car {\n    engine: Engine,\n}\n";
        let tree = parse(src);
        let refs = RustExtractor.extract_references(&tree, src, "a.rs");
        let uses = refs.iter().find(|r| r.kind == EdgeKind::Uses).unwrap();
        assert_eq!(uses.target_name, "Engine");
        assert_eq!(uses.source_name.as_deref(), Some("Car"));
    }

    #[test]
    fn trait_impl_produces_implements_reference() {
        let src = "struct Foo;\ntrait Greet {}\nimpl Greet for Foo {}\n";
        let tree = parse(src);
        let refs = RustExtractor.extract_references(&tree, src, "a.rs");
        let implements = refs.iter().find(|r| r.kind == EdgeKind::Implements).unwrap();
        assert_eq!(implements.target_name, "Greet");
        assert_eq!(implements.source_name.as_deref(), Some("Foo"));
    }
}
