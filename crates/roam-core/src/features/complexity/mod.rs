//! Complexity Analyzer (C7, spec §4.7).
//!
//! Computes cognitive complexity, nesting depth, Halstead metrics, and
//! cyclomatic density for every callable symbol. Walks the tree-sitter
//! AST covering `[line_start, line_end]` (±3 lines of tolerance); falls
//! back to a source-only estimator when no tree is available.

use std::collections::HashSet;

use tree_sitter::Node;

use roam_store::domain::ComplexityRecord;

const LINE_TOLERANCE: i64 = 3;

/// Control-flow node kinds that add `1 + nesting` and increment nesting
/// for their subtree (spec §4.7, "fixed union of AST node types from all
/// supported grammars").
const NESTING_INCREMENTING: &[&str] = &[
    "if_statement",
    "if_expression",
    "for_statement",
    "for_in_statement",
    "for_expression",
    "while_statement",
    "while_expression",
    "loop_expression",
    "do_statement",
    "switch_statement",
    "match_expression",
    "try_statement",
    "catch_clause",
    "conditional_expression",
    "ternary_expression",
];

/// Flat continuations: add 1, do not increment nesting.
const FLAT_CONTINUATION: &[&str] = &["else_clause", "elif_clause", "else_if_clause"];

/// Unconditional flow breaks: add 1.
const FLOW_BREAK: &[&str] = &[
    "break_statement",
    "continue_statement",
    "goto_statement",
    "return_statement",
];

/// Short-circuit boolean operators: add 1 per occurrence.
const BOOL_OPERATORS: &[&str] = &["&&", "||", "and", "or"];

/// Nested function/lambda forms: add 1 and increment nesting for the body.
const NESTED_CALLABLE: &[&str] = &[
    "closure_expression",
    "lambda",
    "function_expression",
    "arrow_function",
    "func_literal",
];

fn is_binary_bool_op(node: Node, source: &str) -> bool {
    if node.kind() != "binary_expression" && node.kind() != "boolean_operator" {
        return false;
    }
    node.child_by_field_name("operator")
        .map(|op| BOOL_OPERATORS.contains(&op.utf8_text(source.as_bytes()).unwrap_or("")))
        .unwrap_or(false)
}

struct Walker {
    cognitive: i64,
    max_nesting: i64,
    return_count: i64,
    bool_op_count: i64,
    callback_depth: i64,
    max_callback_depth: i64,
}

impl Walker {
    fn new() -> Self {
        Self {
            cognitive: 0,
            max_nesting: 0,
            return_count: 0,
            bool_op_count: 0,
            callback_depth: 0,
            max_callback_depth: 0,
        }
    }

    fn walk(&mut self, node: Node, source: &str, nesting: i64) {
        self.max_nesting = self.max_nesting.max(nesting);
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let kind = child.kind();
            if NESTING_INCREMENTING.contains(&kind) {
                self.cognitive += 1 + nesting;
                self.walk(child, source, nesting + 1);
                continue;
            }
            if FLAT_CONTINUATION.contains(&kind) {
                self.cognitive += 1;
                self.walk(child, source, nesting);
                continue;
            }
            if FLOW_BREAK.contains(&kind) {
                self.cognitive += 1;
                if kind == "return_statement" {
                    self.return_count += 1;
                }
                self.walk(child, source, nesting);
                continue;
            }
            if is_binary_bool_op(child, source) {
                self.cognitive += 1;
                self.bool_op_count += 1;
                self.walk(child, source, nesting);
                continue;
            }
            if NESTED_CALLABLE.contains(&kind) {
                self.cognitive += 1;
                self.callback_depth += 1;
                self.max_callback_depth = self.max_callback_depth.max(self.callback_depth);
                self.walk(child, source, nesting + 1);
                self.callback_depth -= 1;
                continue;
            }
            self.walk(child, source, nesting);
        }
    }
}

/// Fixed operator/operand leaf kinds for Halstead `n1`/`n2` (spec §4.7,
/// "fixed operator/operand AST-type sets plus leaf operators taken from
/// raw source under binary-expression parents").
fn halstead_kind(kind: &str) -> Option<bool> {
    // true = operator bucket, false = operand bucket
    match kind {
        "identifier" | "type_identifier" | "field_identifier" | "integer_literal"
        | "float_literal" | "string_literal" | "true" | "false" | "number" | "string" => {
            Some(false)
        }
        "binary_expression" | "unary_expression" | "assignment_expression"
        | "compound_assignment_expr" | "call_expression" | "index_expression" => Some(true),
        _ => None,
    }
}

struct HalsteadCounts {
    operators: HashSet<String>,
    operands: HashSet<String>,
    total_operators: i64,
    total_operands: i64,
}

impl HalsteadCounts {
    fn new() -> Self {
        Self {
            operators: HashSet::new(),
            operands: HashSet::new(),
            total_operators: 0,
            total_operands: 0,
        }
    }

    fn walk(&mut self, node: Node, source: &str) {
        if let Some(is_operator) = halstead_kind(node.kind()) {
            let text = node.utf8_text(source.as_bytes()).unwrap_or(node.kind());
            if is_operator {
                self.operators.insert(node.kind().to_string());
                self.total_operators += 1;
                if node.kind() == "binary_expression" {
                    if let Some(op) = node.child_by_field_name("operator") {
                        let op_text = op.utf8_text(source.as_bytes()).unwrap_or("?");
                        self.operators.insert(op_text.to_string());
                    }
                }
            } else {
                self.operands.insert(text.to_string());
                self.total_operands += 1;
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(child, source);
        }
    }
}

/// Rounds to `decimals` places, matching spec §4.7's explicit rounding
/// rules (1 decimal for most Halstead fields, 3 for bugs).
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Finds the innermost node whose span covers `[line_start, line_end]`
/// within `LINE_TOLERANCE` lines, preferring the smallest covering node.
fn find_covering_node<'a>(root: Node<'a>, line_start: i64, line_end: i64) -> Option<Node<'a>> {
    let target_start = (line_start - LINE_TOLERANCE).max(1);
    let target_end = line_end + LINE_TOLERANCE;

    fn search<'a>(node: Node<'a>, target_start: i64, target_end: i64) -> Option<Node<'a>> {
        let node_start = node.start_position().row as i64 + 1;
        let node_end = node.end_position().row as i64 + 1;
        if node_start < target_start || node_end > target_end {
            return None;
        }
        let mut best = Some(node);
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if let Some(found) = search(child, target_start, target_end) {
                best = Some(found);
            }
        }
        best
    }

    search(root, target_start, target_end)
}

/// Computes the full complexity record for one callable symbol's AST
/// span. Returns `None` only when no node in the tree covers the span
/// even with tolerance (caller should fall back to the degraded
/// estimator in that case).
pub fn analyze_symbol(
    symbol_id: i64,
    root: Node,
    source: &str,
    line_start: i64,
    line_end: i64,
    param_count: i64,
) -> Option<ComplexityRecord> {
    let node = find_covering_node(root, line_start, line_end)?;

    let mut walker = Walker::new();
    walker.walk(node, source, 0);

    let mut halstead = HalsteadCounts::new();
    halstead.walk(node, source);

    let n1 = halstead.operators.len() as f64;
    let n2 = halstead.operands.len().max(1) as f64;
    let big_n1 = halstead.total_operators as f64;
    let big_n2 = halstead.total_operands as f64;
    let n = (n1 + n2).max(1.0);
    let big_n = big_n1 + big_n2;

    let volume = big_n * (n.log2().max(0.0));
    let difficulty = if n2 > 0.0 {
        (n1 / 2.0) * (big_n2 / n2)
    } else {
        0.0
    };
    let effort = difficulty * volume;
    let bugs = volume / 3000.0;

    let line_count = (line_end - line_start + 1).max(1);
    let cyclomatic_density = walker.cognitive as f64 / line_count as f64;

    Some(ComplexityRecord {
        symbol_id,
        cognitive_complexity: walker.cognitive,
        nesting_depth: walker.max_nesting,
        param_count,
        line_count,
        return_count: walker.return_count,
        bool_op_count: walker.bool_op_count,
        callback_depth: walker.max_callback_depth,
        cyclomatic_density: round_to(cyclomatic_density, 3),
        halstead_volume: round_to(volume, 1),
        halstead_difficulty: round_to(difficulty, 1),
        halstead_effort: round_to(effort, 1),
        halstead_bugs: round_to(bugs, 3),
    })
}

/// Degraded source-only estimator used when no AST is available (spec
/// §4.7: "indentation peaks and keyword counts"). Operates on the raw
/// symbol source slice.
pub fn analyze_source_fallback(symbol_id: i64, source_slice: &str, param_count: i64) -> ComplexityRecord {
    const CONTROL_KEYWORDS: &[&str] = &[
        "if", "else", "elif", "for", "while", "switch", "case", "catch", "match",
    ];
    const BOOL_KEYWORDS: &[&str] = &["&&", "||", " and ", " or "];

    let lines: Vec<&str> = source_slice.lines().collect();
    let line_count = lines.len().max(1) as i64;

    let mut cognitive = 0i64;
    let mut max_indent_peak = 0i64;
    let mut return_count = 0i64;
    let mut bool_op_count = 0i64;
    let mut prev_indent = 0i64;

    for line in &lines {
        let indent = (line.len() - line.trim_start().len()) as i64 / 2;
        if indent > prev_indent {
            max_indent_peak = max_indent_peak.max(indent);
        }
        prev_indent = indent;

        let trimmed = line.trim_start();
        for kw in CONTROL_KEYWORDS {
            if trimmed.starts_with(kw) {
                cognitive += 1 + indent;
            }
        }
        if trimmed.starts_with("return") {
            return_count += 1;
            cognitive += 1;
        }
        for op in BOOL_KEYWORDS {
            let count = line.matches(op).count() as i64;
            bool_op_count += count;
            cognitive += count;
        }
    }

    let cyclomatic_density = cognitive as f64 / line_count as f64;

    ComplexityRecord {
        symbol_id,
        cognitive_complexity: cognitive,
        nesting_depth: max_indent_peak,
        param_count,
        line_count,
        return_count,
        bool_op_count,
        callback_depth: 0,
        cyclomatic_density: round_to(cyclomatic_density, 3),
        halstead_volume: 0.0,
        halstead_difficulty: 0.0,
        halstead_effort: 0.0,
        halstead_bugs: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing;
    use roam_store::domain::Language;

    #[test]
    fn simple_function_has_low_cognitive_complexity() {
        let src = "fn greet() -> i32 { 1 }";
        let outcome = parsing::parse(Language::Rust, src);
        let tree = outcome.tree.unwrap();
        let record = analyze_symbol(1, tree.root_node(), src, 1, 1, 0).unwrap();
        assert_eq!(record.cognitive_complexity, 0);
    }

    #[test]
    fn nested_if_inside_loop_accumulates_nesting_penalty() {
        let src = "fn f(x: i32) -> i32 {\n    for i in 0..x {\n        if i > 2 {\n            return i;\n        }\n    }\n    0\n}\n";
        let outcome = parsing::parse(Language::Rust, src);
        let tree = outcome.tree.unwrap();
        let record = analyze_symbol(1, tree.root_node(), src, 1, 8, 1).unwrap();
        // for (+1) then nested if (+2) = 3, plus return flow break (+1) = 4
        assert_eq!(record.cognitive_complexity, 4);
        assert_eq!(record.nesting_depth, 2);
        assert_eq!(record.return_count, 1);
    }

    #[test]
    fn boolean_operators_each_add_one() {
        let src = "fn f(a: bool, b: bool, c: bool) -> bool {\n    a && b || c\n}\n";
        let outcome = parsing::parse(Language::Rust, src);
        let tree = outcome.tree.unwrap();
        let record = analyze_symbol(1, tree.root_node(), src, 1, 3, 3).unwrap();
        assert_eq!(record.bool_op_count, 2);
    }

    #[test]
    fn halstead_fields_are_nonnegative_and_rounded() {
        let src = "fn f(a: i32, b: i32) -> i32 {\n    let c = a + b;\n    c\n}\n";
        let outcome = parsing::parse(Language::Rust, src);
        let tree = outcome.tree.unwrap();
        let record = analyze_symbol(1, tree.root_node(), src, 1, 4, 2).unwrap();
        assert!(record.halstead_volume >= 0.0);
        assert!(record.halstead_difficulty >= 0.0);
        assert!(record.halstead_effort >= 0.0);
        assert!(record.halstead_bugs >= 0.0);
    }

    #[test]
    fn source_fallback_estimates_without_ast() {
        let src = "    if true:\n        return 1\n    return 0\n";
        let record = analyze_source_fallback(1, src, 0);
        assert!(record.cognitive_complexity > 0);
        assert_eq!(record.return_count, 2);
        assert_eq!(record.halstead_volume, 0.0);
    }
}
