//! Symbol/Reference Extractors (C4, spec §4.4).
//!
//! One [`LanguageExtractor`] per supported grammar, registered in
//! [`ExtractorRegistry`] keyed by [`Language`] (spec §9 "Dynamic dispatch
//! over language extractors"). Each extractor exposes two pure operations
//! over `(tree, source, file_path)`: [`LanguageExtractor::extract_symbols`]
//! and [`LanguageExtractor::extract_references`]. References target names
//! as written at the call site — resolution is deferred to C5.

mod go;
mod python;
mod rust;
mod typescript;
pub mod vue_template;

use roam_store::domain::{EdgeKind, Language, SymbolKind, Visibility};
use tree_sitter::Tree;

/// A symbol as produced by extraction, before the store assigns an id.
/// Mirrors `roam_store::domain::NewSymbol` minus `file_id`, which the
/// pipeline fills in at insert time.
#[derive(Debug, Clone)]
pub struct ExtractedSymbol {
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub signature: Option<String>,
    pub line_start: i64,
    pub line_end: i64,
    pub docstring: Option<String>,
    pub visibility: Visibility,
    pub is_exported: bool,
    pub parent_name: Option<String>,
    pub default_value: Option<String>,
}

/// A raw, unresolved reference (spec §3 "Reference (transient)").
#[derive(Debug, Clone)]
pub struct RawReference {
    pub source_name: Option<String>,
    pub target_name: String,
    pub kind: EdgeKind,
    pub line: i64,
    pub source_file: String,
}

/// Per-language extractor contract (spec §4.4).
pub trait LanguageExtractor: Send + Sync {
    fn extract_symbols(&self, tree: &Tree, source: &str, file_path: &str) -> Vec<ExtractedSymbol>;
    fn extract_references(&self, tree: &Tree, source: &str, file_path: &str) -> Vec<RawReference>;
}

/// Registry of extractors, populated once at process start (spec §9).
pub struct ExtractorRegistry {
    rust: rust::RustExtractor,
    python: python::PythonExtractor,
    typescript: typescript::TypeScriptExtractor,
    go: go::GoExtractor,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            rust: rust::RustExtractor,
            python: python::PythonExtractor,
            typescript: typescript::TypeScriptExtractor,
            go: go::GoExtractor,
        }
    }

    pub fn get(&self, language: Language) -> Option<&dyn LanguageExtractor> {
        match language {
            Language::Rust => Some(&self.rust),
            Language::Python => Some(&self.python),
            // Vue's effective language after script extraction is always
            // TypeScript or JavaScript; both route through the same
            // extractor (spec §4.3 "embedded-script-block languages").
            Language::TypeScript | Language::JavaScript => Some(&self.typescript),
            Language::Go => Some(&self.go),
            Language::Vue | Language::PlainText | Language::Unknown => None,
        }
    }
}

/// Shared text/line helpers used by every per-language extractor.
pub(crate) mod util {
    use tree_sitter::Node;

    pub fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
        node.utf8_text(source.as_bytes()).unwrap_or("")
    }

    /// 1-indexed start line (spec symbols use 1-indexed `line_start`).
    pub fn start_line(node: Node) -> i64 {
        node.start_position().row as i64 + 1
    }

    pub fn end_line(node: Node) -> i64 {
        node.end_position().row as i64 + 1
    }

    pub fn child_text<'a>(node: Node, field: &str, source: &'a str) -> Option<&'a str> {
        node.child_by_field_name(field)
            .map(|n| node_text(n, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_one_extractor_per_grammar_language() {
        let reg = ExtractorRegistry::new();
        assert!(reg.get(Language::Rust).is_some());
        assert!(reg.get(Language::Python).is_some());
        assert!(reg.get(Language::TypeScript).is_some());
        assert!(reg.get(Language::JavaScript).is_some());
        assert!(reg.get(Language::Go).is_some());
        assert!(reg.get(Language::PlainText).is_none());
        assert!(reg.get(Language::Vue).is_none());
    }
}
