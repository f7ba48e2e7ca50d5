//! Parser Coordinator (C3, spec §4.3).
//!
//! Maps file extension → [`Language`], language → tree-sitter grammar, and
//! exposes a single `parse` operation: `(language, source) -> (tree?,
//! effective_source, effective_language)`. Regex-only languages never
//! attempt a grammar load. Embedded-script formats (`.vue`) preprocess the
//! source before parsing so extracted line numbers stay faithful to the
//! original file.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use tree_sitter::{Language as TsLanguage, Parser, Tree};

use roam_store::domain::Language;

/// Per-process parse-failure counter (spec §4.3 "a per-process counter is
/// incremented").
static PARSE_FAILURES: AtomicU64 = AtomicU64::new(0);

pub fn parse_failure_count() -> u64 {
    PARSE_FAILURES.load(Ordering::Relaxed)
}

/// Extension → language, independent of grammar availability.
pub fn language_for_extension(ext: &str) -> Language {
    match ext.to_ascii_lowercase().as_str() {
        "rs" => Language::Rust,
        "py" | "pyi" => Language::Python,
        "ts" | "tsx" | "mts" | "cts" => Language::TypeScript,
        "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
        "go" => Language::Go,
        "vue" => Language::Vue,
        "json" | "yaml" | "yml" | "toml" | "md" | "markdown" | "txt" | "cfg" | "ini" => {
            Language::PlainText
        }
        _ => Language::Unknown,
    }
}

pub fn language_for_path(path: &str) -> Language {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some(ext) => language_for_extension(ext),
        None => Language::Unknown,
    }
}

fn ts_grammar(language: Language) -> Option<TsLanguage> {
    match language {
        Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
        Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
        Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        // JS reuses the TypeScript grammar's JS dialect (spec §4.3
        // "one grammar reused for several related languages"); TSX is a
        // strict syntactic superset of plain JS.
        Language::JavaScript => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
        Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
        Language::Vue => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
        Language::PlainText | Language::Unknown => None,
    }
}

/// Outcome of a parse attempt.
pub struct ParseOutcome {
    pub tree: Option<Tree>,
    pub effective_source: String,
    pub effective_language: Language,
}

/// Replaces every line outside `<script ...>...</script>` with a blank
/// line, preserving line numbers (spec §4.3). Upgrades the effective
/// language to TypeScript when `lang="ts"` appears on the opening tag.
fn extract_vue_script(source: &str) -> (String, Language) {
    let mut in_script = false;
    let mut language = Language::JavaScript;
    let mut out_lines = Vec::with_capacity(source.lines().count());

    for line in source.lines() {
        let lower = line.to_ascii_lowercase();
        if !in_script && lower.contains("<script") {
            in_script = true;
            if lower.contains("lang=\"ts\"") || lower.contains("lang='ts'") {
                language = Language::TypeScript;
            }
            // Keep nothing from the tag line itself; scripts rarely start
            // code on the same line as the opening tag.
            out_lines.push(String::new());
            continue;
        }
        if in_script && lower.contains("</script") {
            in_script = false;
            out_lines.push(String::new());
            continue;
        }
        if in_script {
            out_lines.push(line.to_string());
        } else {
            out_lines.push(String::new());
        }
    }
    (out_lines.join("\n"), language)
}

/// Parses `source` for `language`. Regex-only and unknown languages return
/// `tree: None` without incrementing the failure counter — that bucket is
/// "no error" per spec §4.3/§7. A genuine grammar parse failure increments
/// the counter and returns `tree: None`.
pub fn parse(language: Language, source: &str) -> ParseOutcome {
    if language == Language::Vue {
        let (script_source, effective_language) = extract_vue_script(source);
        let mut outcome = parse(effective_language, &script_source);
        outcome.effective_source = script_source;
        return outcome;
    }

    let grammar = match ts_grammar(language) {
        Some(g) => g,
        None => {
            return ParseOutcome {
                tree: None,
                effective_source: source.to_string(),
                effective_language: language,
            }
        }
    };

    let mut parser = Parser::new();
    if parser.set_language(&grammar).is_err() {
        PARSE_FAILURES.fetch_add(1, Ordering::Relaxed);
        return ParseOutcome {
            tree: None,
            effective_source: source.to_string(),
            effective_language: language,
        };
    }

    match parser.parse(source, None) {
        Some(tree) => ParseOutcome {
            tree: Some(tree),
            effective_source: source.to_string(),
            effective_language: language,
        },
        None => {
            PARSE_FAILURES.fetch_add(1, Ordering::Relaxed);
            ParseOutcome {
                tree: None,
                effective_source: source.to_string(),
                effective_language: language,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_maps_to_expected_language() {
        assert_eq!(language_for_extension("rs"), Language::Rust);
        assert_eq!(language_for_extension("py"), Language::Python);
        assert_eq!(language_for_extension("tsx"), Language::TypeScript);
        assert_eq!(language_for_extension("yaml"), Language::PlainText);
        assert_eq!(language_for_extension("xyz"), Language::Unknown);
    }

    #[test]
    fn rust_source_parses_without_error() {
        let outcome = parse(Language::Rust, "fn main() {}");
        assert!(outcome.tree.is_some());
    }

    #[test]
    fn plaintext_never_attempts_a_grammar() {
        let before = parse_failure_count();
        let outcome = parse(Language::PlainText, "key: value");
        assert!(outcome.tree.is_none());
        assert_eq!(parse_failure_count(), before);
    }

    #[test]
    fn vue_script_block_is_isolated_and_other_lines_blanked() {
        let source = "<template>\n<div/>\n</template>\n<script>\nfunction f() {}\n</script>\n";
        let (extracted, lang) = extract_vue_script(source);
        assert_eq!(lang, Language::JavaScript);
        let lines: Vec<&str> = extracted.lines().collect();
        assert_eq!(lines[1], ""); // <div/> blanked
        assert_eq!(lines[4], "function f() {}");
        assert_eq!(lines.len(), source.lines().count());
    }

    #[test]
    fn vue_script_lang_ts_upgrades_to_typescript() {
        let source = "<script lang=\"ts\">\nconst x: number = 1;\n</script>\n";
        let (_, lang) = extract_vue_script(source);
        assert_eq!(lang, Language::TypeScript);
    }
}
