//! Domain model for the relational store (spec §3, §4.6).
//!
//! Every row type here is a plain, `serde`-derived struct with an `i64`
//! surrogate key where the schema assigns one. The store owns these types
//! exclusively — `roam-core` constructs `New*` variants (no id yet) and
//! receives back the assigned id from [`CodeIndexStore`].

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod port;
pub use port::{CodeIndexStore, FileChangeSet};

// ═══════════════════════════════════════════════════════════════════════
// Enums
// ═══════════════════════════════════════════════════════════════════════

/// Source language of a file, closed over the grammars this engine embeds
/// plus the regex-only and unknown buckets (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Rust,
    Python,
    TypeScript,
    JavaScript,
    Go,
    Vue,
    /// No grammar; source kept raw, zero symbols (JSON/YAML/TOML/Markdown/…).
    PlainText,
    Unknown,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Go => "go",
            Language::Vue => "vue",
            Language::PlainText => "plaintext",
            Language::Unknown => "unknown",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "rust" => Language::Rust,
            "python" => Language::Python,
            "typescript" => Language::TypeScript,
            "javascript" => Language::JavaScript,
            "go" => Language::Go,
            "vue" => Language::Vue,
            "plaintext" => Language::PlainText,
            _ => Language::Unknown,
        }
    }

    /// Grammars with no tree-sitter parser: source is kept, never an error.
    pub fn is_regex_only(&self) -> bool {
        matches!(self, Language::PlainText)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role a file plays in the tree, independent of language (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileRole {
    Source,
    Test,
    Config,
    Doc,
    Generated,
    Other,
}

impl FileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileRole::Source => "source",
            FileRole::Test => "test",
            FileRole::Config => "config",
            FileRole::Doc => "doc",
            FileRole::Generated => "generated",
            FileRole::Other => "other",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "source" => FileRole::Source,
            "test" => FileRole::Test,
            "config" => FileRole::Config,
            "doc" => FileRole::Doc,
            "generated" => FileRole::Generated,
            _ => FileRole::Other,
        }
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Symbol kind (spec §3: "function, class, method, interface, enum, struct,
/// trait, module, constant, variable, property, …").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Interface,
    Enum,
    Struct,
    Trait,
    Module,
    Constant,
    Variable,
    Property,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Enum => "enum",
            SymbolKind::Struct => "struct",
            SymbolKind::Trait => "trait",
            SymbolKind::Module => "module",
            SymbolKind::Constant => "constant",
            SymbolKind::Variable => "variable",
            SymbolKind::Property => "property",
        }
    }

    pub fn from_str_lossy(s: &str) -> Option<Self> {
        Some(match s {
            "function" => SymbolKind::Function,
            "method" => SymbolKind::Method,
            "class" => SymbolKind::Class,
            "interface" => SymbolKind::Interface,
            "enum" => SymbolKind::Enum,
            "struct" => SymbolKind::Struct,
            "trait" => SymbolKind::Trait,
            "module" => SymbolKind::Module,
            "constant" => SymbolKind::Constant,
            "variable" => SymbolKind::Variable,
            "property" => SymbolKind::Property,
            _ => return None,
        })
    }

    /// Callable kinds, used by the resolver's candidate-ranking tie-break
    /// (spec §4.5: "prefer callable kind matching the reference kind").
    pub fn is_callable(&self) -> bool {
        matches!(self, SymbolKind::Function | SymbolKind::Method)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Visibility as recorded at the source level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Internal,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "public" => Visibility::Public,
            "protected" => Visibility::Protected,
            "internal" => Visibility::Internal,
            _ => Visibility::Private,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved edge kind (spec §3: "call, uses, inherits, implements,
/// uses_trait, template, import, reference, template-ref").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Call,
    Uses,
    Inherits,
    Implements,
    UsesTrait,
    Template,
    Import,
    Reference,
    TemplateRef,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Call => "call",
            EdgeKind::Uses => "uses",
            EdgeKind::Inherits => "inherits",
            EdgeKind::Implements => "implements",
            EdgeKind::UsesTrait => "uses_trait",
            EdgeKind::Template => "template",
            EdgeKind::Import => "import",
            EdgeKind::Reference => "reference",
            EdgeKind::TemplateRef => "template-ref",
        }
    }

    pub fn from_str_lossy(s: &str) -> Option<Self> {
        Some(match s {
            "call" => EdgeKind::Call,
            "uses" => EdgeKind::Uses,
            "inherits" => EdgeKind::Inherits,
            "implements" => EdgeKind::Implements,
            "uses_trait" => EdgeKind::UsesTrait,
            "template" => EdgeKind::Template,
            "import" => EdgeKind::Import,
            "reference" => EdgeKind::Reference,
            "template-ref" => EdgeKind::TemplateRef,
            _ => return None,
        })
    }

    /// Per-kind weight used by Yen's k-shortest paths (spec §4.10 step 4).
    pub fn path_weight(&self) -> f64 {
        match self {
            EdgeKind::Import => 1.1,
            EdgeKind::Reference => 1.2,
            _ => 1.0,
        }
    }

    /// True when this kind should be reflected as `imports` on the
    /// aggregated file edge (spec §4.5 "File edges").
    pub fn implies_import(&self) -> bool {
        matches!(self, EdgeKind::Import | EdgeKind::Reference)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// File edge kind — just the two buckets spec §4.5 describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileEdgeKind {
    Imports,
    Uses,
}

impl FileEdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileEdgeKind::Imports => "imports",
            FileEdgeKind::Uses => "uses",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        if s == "imports" {
            FileEdgeKind::Imports
        } else {
            FileEdgeKind::Uses
        }
    }
}

impl fmt::Display for FileEdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// File
// ═══════════════════════════════════════════════════════════════════════

/// A file as staged for insertion — no id yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFile {
    pub path: String,
    pub language: Language,
    pub file_role: FileRole,
    pub content_hash: String,
    pub mtime: i64,
    pub line_count: i64,
}

/// A file row as read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub path: String,
    pub language: Language,
    pub file_role: FileRole,
    pub content_hash: String,
    pub mtime: i64,
    pub line_count: i64,
}

// ═══════════════════════════════════════════════════════════════════════
// Symbol
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSymbol {
    pub file_id: i64,
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub signature: Option<String>,
    pub line_start: i64,
    pub line_end: i64,
    pub docstring: Option<String>,
    pub visibility: Visibility,
    pub is_exported: bool,
    /// Name of the enclosing symbol in the same file, resolved to an id by
    /// the store at insert time (spec §4.11 step 4: "resolving `parent_id`
    /// by name within file").
    pub parent_name: Option<String>,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub id: i64,
    pub file_id: i64,
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub signature: Option<String>,
    pub line_start: i64,
    pub line_end: i64,
    pub docstring: Option<String>,
    pub visibility: Visibility,
    pub is_exported: bool,
    pub parent_id: Option<i64>,
    pub default_value: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════
// Edge / FileEdge
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source_symbol_id: i64,
    pub target_symbol_id: i64,
    pub kind: EdgeKind,
    pub line: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FileEdgeRecord {
    pub source_file_id: i64,
    pub target_file_id: i64,
    pub kind: FileEdgeKind,
    pub symbol_count: i64,
}

// ═══════════════════════════════════════════════════════════════════════
// Metrics / Clusters
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SymbolMetricRecord {
    pub symbol_id: i64,
    pub pagerank: f64,
    pub in_degree: i64,
    pub out_degree: i64,
    pub betweenness: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ComplexityRecord {
    pub symbol_id: i64,
    pub cognitive_complexity: i64,
    pub nesting_depth: i64,
    pub param_count: i64,
    pub line_count: i64,
    pub return_count: i64,
    pub bool_op_count: i64,
    pub callback_depth: i64,
    pub cyclomatic_density: f64,
    pub halstead_volume: f64,
    pub halstead_difficulty: f64,
    pub halstead_effort: f64,
    pub halstead_bugs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub symbol_id: i64,
    pub cluster_id: i64,
    pub cluster_label: String,
}

// ═══════════════════════════════════════════════════════════════════════
// Git artifacts
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitCommit {
    pub hash: String,
    pub author: String,
    pub timestamp: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitFileChange {
    pub commit_hash: String,
    pub file_id: Option<i64>,
    pub path: String,
    pub lines_added: i64,
    pub lines_removed: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CochangeRecord {
    pub file_a: i64,
    pub file_b: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FileStatsRecord {
    pub file_id: i64,
    pub commit_count: i64,
    pub total_churn: i64,
    pub distinct_authors: i64,
    pub complexity: f64,
    pub cochange_entropy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHyperedge {
    pub commit_hash: String,
    pub file_count: i64,
    pub sig_hash: String,
    /// File ids in sort order; `ordinal` is the index in this vec.
    pub members: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HyperedgeRecord {
    pub id: i64,
    pub commit_hash: String,
    pub file_count: i64,
    pub sig_hash: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HyperedgeMember {
    pub hyperedge_id: i64,
    pub file_id: i64,
    pub ordinal: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_round_trips_through_display_and_parse() {
        for lang in [
            Language::Rust,
            Language::Python,
            Language::TypeScript,
            Language::JavaScript,
            Language::Go,
            Language::Vue,
            Language::PlainText,
        ] {
            assert_eq!(Language::from_str_lossy(&lang.to_string()), lang);
        }
    }

    #[test]
    fn edge_kind_weights_match_yen_table() {
        assert_eq!(EdgeKind::Call.path_weight(), 1.0);
        assert_eq!(EdgeKind::Import.path_weight(), 1.1);
        assert_eq!(EdgeKind::Reference.path_weight(), 1.2);
    }

    #[test]
    fn symbol_kind_callable_matches_function_and_method_only() {
        assert!(SymbolKind::Function.is_callable());
        assert!(SymbolKind::Method.is_callable());
        assert!(!SymbolKind::Class.is_callable());
    }
}
