//! TypeScript/JavaScript symbol/reference extraction over the
//! `tree-sitter-typescript` grammar (shared by both languages, spec §4.3).

use roam_store::domain::{EdgeKind, SymbolKind, Visibility};
use tree_sitter::{Node, Tree};

use super::util::{child_text, end_line, node_text, start_line};
use super::{ExtractedSymbol, LanguageExtractor, RawReference};

pub struct TypeScriptExtractor;

/// True when `node` (or its immediate `export_statement` wrapper) is
/// exported.
fn is_exported(node: Node) -> bool {
    node.parent()
        .map(|p| p.kind() == "export_statement")
        .unwrap_or(false)
}

fn docstring_above(node: Node, source: &str) -> Option<String> {
    let start = node.parent().filter(|p| p.kind() == "export_statement").unwrap_or(node);
    let mut lines = Vec::new();
    let mut sibling = start.prev_sibling();
    while let Some(s) = sibling {
        if s.kind() == "comment" {
            let text = node_text(s, source);
            if text.starts_with("/**") || text.starts_with("//") {
                lines.push(text.to_string());
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

fn walk_symbols(node: Node, source: &str, parent: Option<&str>, out: &mut Vec<ExtractedSymbol>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_declaration" => {
                if let Some(name) = child_text(child, "name", source) {
                    out.push(symbol(
                        child, name, source, parent,
                        if parent.is_some() { SymbolKind::Method } else { SymbolKind::Function },
                        child.child_by_field_name("parameters").map(|n| node_text(n, source).to_string()),
                        None,
                    ));
                }
            }
            "method_definition" => {
                if let Some(name) = child_text(child, "name", source) {
                    out.push(symbol(
                        child, name, source, parent, SymbolKind::Method,
                        child.child_by_field_name("parameters").map(|n| node_text(n, source).to_string()),
                        None,
                    ));
                }
            }
            "class_declaration" => {
                if let Some(name) = child_text(child, "name", source) {
                    out.push(symbol(child, name, source, parent, SymbolKind::Class, None, None));
                    if let Some(body) = child.child_by_field_name("body") {
                        walk_symbols(body, source, Some(name), out);
                    }
                    continue;
                }
            }
            "interface_declaration" => {
                if let Some(name) = child_text(child, "name", source) {
                    out.push(symbol(child, name, source, parent, SymbolKind::Interface, None, None));
                }
            }
            "enum_declaration" => {
                if let Some(name) = child_text(child, "name", source) {
                    out.push(symbol(child, name, source, parent, SymbolKind::Enum, None, None));
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                for decl in child.children(&mut child.walk()) {
                    if decl.kind() == "variable_declarator" {
                        if let Some(name_node) = decl.child_by_field_name("name") {
                            if name_node.kind() == "identifier" {
                                let name = node_text(name_node, source);
                                let is_const = node_text(child, source).trim_start().starts_with("const");
                                let default_value = decl
                                    .child_by_field_name("value")
                                    .map(|n| node_text(n, source).to_string());
                                out.push(symbol(
                                    child, name, source, parent,
                                    if is_const && parent.is_none() {
                                        SymbolKind::Constant
                                    } else {
                                        SymbolKind::Variable
                                    },
                                    None, default_value,
                                ));
                            }
                        }
                    }
                }
            }
            "public_field_definition" | "property_signature" => {
                if let Some(name) = child_text(child, "name", source) {
                    out.push(symbol(child, name, source, parent, SymbolKind::Property, None,
                        child.child_by_field_name("value").map(|n| node_text(n, source).to_string())));
                }
            }
            _ => {}
        }
        walk_symbols(child, source, parent, out);
    }
}

fn symbol(
    node: Node,
    name: &str,
    source: &str,
    parent: Option<&str>,
    kind: SymbolKind,
    signature: Option<String>,
    default_value: Option<String>,
) -> ExtractedSymbol {
    let exported = is_exported(node);
    ExtractedSymbol {
        name: name.to_string(),
        qualified_name: match parent {
            Some(p) => format!("{p}.{name}"),
            None => name.to_string(),
        },
        kind,
        signature,
        line_start: start_line(node),
        line_end: end_line(node),
        docstring: docstring_above(node, source),
        visibility: if exported || parent.is_none() {
            Visibility::Public
        } else {
            Visibility::Private
        },
        is_exported: exported,
        parent_name: parent.map(|p| p.to_string()),
        default_value,
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
            "function_declaration" | "method_definition" | "class_declaration" => {
                if let Some(name) = child_text(child, "name", source) {
                    child_scope = Some(name.to_string());
                }
            }
            "public_field_definition" | "property_signature" => {
                if let Some(ty) = child.child_by_field_name("type") {
                    for ident in super_identifiers(ty, source) {
                        out.push(RawReference {
                            source_name: scope.map(|s| s.to_string()),
                            target_name: ident,
                            kind: EdgeKind::Uses,
                            line: start_line(child),
                            source_file: file_path.to_string(),
                        });
                    }
                }
            }
            "call_expression" => {
                if let Some(func) = child.child_by_field_name("function") {
                    let name = match func.kind() {
                        "identifier" => Some(node_text(func, source).to_string()),
                        "member_expression" => func
                            .child_by_field_name("property")
                            .map(|p| node_text(p, source).to_string()),
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
            "import_statement" => {
                if let Some(source_node) = child.child_by_field_name("source") {
                    let spec = node_text(source_node, source).trim_matches(|c| c == '"' || c == '\'');
                    let name = spec.rsplit('/').next().unwrap_or(spec).to_string();
                    out.push(RawReference {
                        source_name: None,
                        target_name: name,
                        kind: EdgeKind::Import,
                        line: start_line(child),
                        source_file: file_path.to_string(),
                    });
                }
            }
            "class_heritage" => {
                let mut heritage_cursor = child.walk();
                for clause in child.children(&mut heritage_cursor) {
                    let kind = match clause.kind() {
                        "extends_clause" => EdgeKind::Inherits,
                        "implements_clause" => EdgeKind::Implements,
                        _ => continue,
                    };
                    for ident in super_identifiers(clause, source) {
                        out.push(RawReference {
                            source_name: scope.map(|s| s.to_string()),
                            target_name: ident,
                            kind,
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

fn super_identifiers(node: Node, source: &str) -> Vec<String> {
    let mut out = Vec::new();
    if node.kind() == "identifier" || node.kind() == "type_identifier" {
        out.push(node_text(node, source).to_string());
        return out;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        out.extend(super_identifiers(child, source));
    }
    out
}

impl LanguageExtractor for TypeScriptExtractor {
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
        crate::features::parsing::parse(roam_store::domain::Language::TypeScript, src)
            .tree
            .expect("typescript source should parse")
    }

    #[test]
    fn extracts_exported_function_and_class_method() {
        let src = "export function greet() {}\nclass Foo {\n  bar() {}\n}\n";
        let tree = parse(src);
        let symbols = TypeScriptExtractor.extract_symbols(&tree, src, "a.ts");
        let greet = symbols.iter().find(|s| s.name == "greet").unwrap();
        assert!(greet.is_exported);
        let bar = symbols.iter().find(|s| s.name == "bar").unwrap();
        assert_eq!(bar.qualified_name, "Foo.bar");
    }

    #[test]
    fn recurses_into_export_statement_for_every_wrapped_declaration_kind() {
        let src = "export class Foo {}\nexport interface Bar {}\nexport enum Baz { A }\nexport const x = 1;\n";
        let tree = parse(src);
        let symbols = TypeScriptExtractor.extract_symbols(&tree, src, "a.ts");
        let foo = symbols.iter().find(|s| s.name == "Foo").unwrap();
        assert!(foo.is_exported);
        let bar = symbols.iter().find(|s| s.name == "Bar").unwrap();
        assert!(bar.is_exported);
        let baz = symbols.iter().find(|s| s.name == "Baz").unwrap();
        assert!(baz.is_exported);
        let x = symbols.iter().find(|s| s.name == "x").unwrap();
        assert!(x.is_exported);
    }

    #[test]
    fn import_statement_produces_import_reference() {
        let src = "import { useState } from 'react';\n";
        let tree = parse(src);
        let refs = TypeScriptExtractor.extract_references(&tree, src, "a.ts");
        assert!(refs.iter().any(|r| r.target_name == "react" && r.kind == EdgeKind::Import));
    }

    #[test]
    fn call_expression_produces_call_reference() {
        let src = "function a() { b(); }\nfunction b() {}\n";
        let tree = parse(src);
        let refs = TypeScriptExtractor.extract_references(&tree, src, "a.ts");
        assert!(refs.iter().any(|r| r.target_name == "b" && r.kind == EdgeKind::Call));
    }

    #[test]
    fn class_field_type_produces_uses_reference() {
        let src = "class Engine {}\nclass Car {\n  engine: Engine;\n}\n";
        let tree = parse(src);
        let refs = TypeScriptExtractor.extract_references(&tree, src, "a.ts");
        let uses = refs.iter().find(|r| r.kind == EdgeKind::Uses).unwrap();
        assert_eq!(uses.target_name, "Engine");
        assert_eq!(uses.source_name.as_deref(), Some("Car"));
    }

    #[test]
    fn class_heritage_splits_extends_and_implements() {
        let src = "class Foo extends Base implements Greetable {}\n";
        let tree = parse(src);
        let refs = TypeScriptExtractor.extract_references(&tree, src, "a.ts");
        assert!(refs.iter().any(|r| r.target_name == "Base" && r.kind == EdgeKind::Inherits));
        assert!(refs.iter().any(|r| r.target_name == "Greetable" && r.kind == EdgeKind::Implements));
    }
}
