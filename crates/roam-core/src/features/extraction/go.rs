//! Go symbol/reference extraction over the `tree-sitter-go` grammar.

use roam_store::domain::{EdgeKind, SymbolKind, Visibility};
use tree_sitter::{Node, Tree};

use super::util::{child_text, end_line, node_text, start_line};
use super::{ExtractedSymbol, LanguageExtractor, RawReference};

pub struct GoExtractor;

/// Go visibility is purely syntactic: an uppercase first letter exports
/// the identifier from the package (spec §4.4 "`is_exported` reflects
/// source-level export/public visibility").
fn visibility_of(name: &str) -> (Visibility, bool) {
    let exported = name.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
    (
        if exported { Visibility::Public } else { Visibility::Private },
        exported,
    )
}

fn doc_comment_above(node: Node, source: &str) -> Option<String> {
    let mut lines = Vec::new();
    let mut sibling = node.prev_sibling();
    while let Some(s) = sibling {
        if s.kind() == "comment" {
            lines.push(node_text(s, source).trim_start_matches("//").trim().to_string());
            sibling = s.prev_sibling();
            continue;
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

fn walk_symbols(node: Node, source: &str, out: &mut Vec<ExtractedSymbol>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "function_declaration" => {
                if let Some(name) = child_text(child, "name", source) {
                    let (visibility, exported) = visibility_of(name);
                    out.push(ExtractedSymbol {
                        name: name.to_string(),
                        qualified_name: name.to_string(),
                        kind: SymbolKind::Function,
                        signature: child
                            .child_by_field_name("parameters")
                            .map(|n| node_text(n, source).to_string()),
                        line_start: start_line(child),
                        line_end: end_line(child),
                        docstring: doc_comment_above(child, source),
                        visibility,
                        is_exported: exported,
                        parent_name: None,
                        default_value: None,
                    });
                }
            }
            "method_declaration" => {
                if let Some(name) = child_text(child, "name", source) {
                    let (visibility, exported) = visibility_of(name);
                    let receiver_type = child
                        .child_by_field_name("receiver")
                        .and_then(|r| receiver_type_name(r, source));
                    out.push(ExtractedSymbol {
                        name: name.to_string(),
                        qualified_name: match &receiver_type {
                            Some(t) => format!("{t}.{name}"),
                            None => name.to_string(),
                        },
                        kind: SymbolKind::Method,
                        signature: child
                            .child_by_field_name("parameters")
                            .map(|n| node_text(n, source).to_string()),
                        line_start: start_line(child),
                        line_end: end_line(child),
                        docstring: doc_comment_above(child, source),
                        visibility,
                        is_exported: exported,
                        parent_name: receiver_type,
                        default_value: None,
                    });
                }
            }
            "type_declaration" => {
                let mut tc = child.walk();
                for spec in child.children(&mut tc) {
                    if spec.kind() != "type_spec" {
                        continue;
                    }
                    if let Some(name) = child_text(spec, "name", source) {
                        let (visibility, exported) = visibility_of(name);
                        let kind = match spec.child_by_field_name("type").map(|t| t.kind()) {
                            Some("struct_type") => SymbolKind::Struct,
                            Some("interface_type") => SymbolKind::Interface,
                            _ => SymbolKind::Struct,
                        };
                        out.push(ExtractedSymbol {
                            name: name.to_string(),
                            qualified_name: name.to_string(),
                            kind,
                            signature: None,
                            line_start: start_line(spec),
                            line_end: end_line(spec),
                            docstring: doc_comment_above(child, source),
                            visibility,
                            is_exported: exported,
                            parent_name: None,
                            default_value: None,
                        });
                    }
                }
            }
            "const_declaration" | "var_declaration" => {
                let mut sc = child.walk();
                for spec in child.children(&mut sc) {
                    if spec.kind() != "const_spec" && spec.kind() != "var_spec" {
                        continue;
                    }
                    if let Some(name_node) = spec.child_by_field_name("name") {
                        let name = node_text(name_node, source);
                        let (visibility, exported) = visibility_of(name);
                        out.push(ExtractedSymbol {
                            name: name.to_string(),
                            qualified_name: name.to_string(),
                            kind: if child.kind() == "const_declaration" {
                                SymbolKind::Constant
                            } else {
                                SymbolKind::Variable
                            },
                            signature: None,
                            line_start: start_line(spec),
                            line_end: end_line(spec),
                            docstring: None,
                            visibility,
                            is_exported: exported,
                            parent_name: None,
                            default_value: spec
                                .child_by_field_name("value")
                                .map(|n| node_text(n, source).to_string()),
                        });
                    }
                }
            }
            _ => {}
        }
    }
}

fn receiver_type_name(receiver: Node, source: &str) -> Option<String> {
    // receiver: parameter_list containing a single parameter_declaration
    // whose type is either `type_identifier` or `pointer_type`.
    let mut cursor = receiver.walk();
    for param in receiver.children(&mut cursor) {
        if param.kind() == "parameter_declaration" {
            if let Some(ty) = param.child_by_field_name("type") {
                return Some(
                    match ty.kind() {
                        "pointer_type" => ty
                            .named_child(0)
                            .map(|n| node_text(n, source).to_string())
                            .unwrap_or_else(|| node_text(ty, source).to_string()),
                        _ => node_text(ty, source).to_string(),
                    },
                );
            }
        }
    }
    None
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
            "function_declaration" | "method_declaration" => {
                if let Some(name) = child_text(child, "name", source) {
                    child_scope = Some(name.to_string());
                }
            }
            "call_expression" => {
                if let Some(func) = child.child_by_field_name("function") {
                    let name = match func.kind() {
                        "identifier" => Some(node_text(func, source).to_string()),
                        "selector_expression" => func
                            .child_by_field_name("field")
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
            "import_spec" => {
                if let Some(path_node) = child.child_by_field_name("path") {
                    let spec = node_text(path_node, source).trim_matches('"');
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
            _ => {}
        }
        walk_references(child, source, file_path, child_scope.as_deref(), out);
    }
}

impl LanguageExtractor for GoExtractor {
    fn extract_symbols(&self, tree: &Tree, source: &str, _file_path: &str) -> Vec<ExtractedSymbol> {
        let mut out = Vec::new();
        walk_symbols(tree.root_node(), source, &mut out);
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
        crate::features::parsing::parse(roam_store::domain::Language::Go, src)
            .tree
            .expect("go source should parse")
    }

    #[test]
    fn extracts_exported_function_and_method_with_receiver() {
        let src = "package main\n\ntype Foo struct {}\n\nfunc (f *Foo) Bar() {}\n\nfunc Greet() {}\n";
        let tree = parse(src);
        let symbols = GoExtractor.extract_symbols(&tree, src, "a.go");
        let bar = symbols.iter().find(|s| s.name == "Bar").unwrap();
        assert_eq!(bar.qualified_name, "Foo.Bar");
        assert!(bar.is_exported);
        let greet = symbols.iter().find(|s| s.name == "Greet").unwrap();
        assert!(greet.is_exported);
    }

    #[test]
    fn lowercase_name_is_unexported() {
        let src = "package main\n\nfunc helper() {}\n";
        let tree = parse(src);
        let symbols = GoExtractor.extract_symbols(&tree, src, "a.go");
        assert!(!symbols[0].is_exported);
        assert_eq!(symbols[0].visibility, Visibility::Private);
    }

    #[test]
    fn import_spec_produces_import_reference() {
        let src = "package main\n\nimport \"fmt\"\n";
        let tree = parse(src);
        let refs = GoExtractor.extract_references(&tree, src, "a.go");
        assert!(refs.iter().any(|r| r.target_name == "fmt" && r.kind == EdgeKind::Import));
    }
}
