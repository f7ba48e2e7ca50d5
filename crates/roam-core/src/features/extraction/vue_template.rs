//! Regex-based template scanning for Vue single-file components (spec
//! §4.4 "may be joined with regex-based scans of templates or embedded
//! DSL regions"). The `<script>` block is parsed by the TypeScript
//! grammar (see [`super::super::parsing::parse`]); this module covers the
//! other half: the `<template>` block, which has no grammar in this
//! workspace's dependency stack and is scanned with `regex` instead.
//!
//! Two reference shapes come out of a template, matching the two
//! `EdgeKind` variants the spec reserves for this (`template`,
//! `template-ref`):
//!
//! - A PascalCase tag (`<UserCard ...>`) is a **component** reference
//!   (`EdgeKind::Template`) — the template is using another component
//!   symbol, typically imported at the top of the script block.
//! - A `{{ identifier }}` interpolation or a `v-bind`/`:`/`@` directive
//!   value's leading identifier is a **data/method** reference
//!   (`EdgeKind::TemplateRef`) — the template reads a symbol defined in
//!   the component's script (a `data`/`computed`/`setup` binding).
//!
//! Both kinds carry no `source_name`: per spec §4.5 step 3, the resolver
//! falls back to the containing file's unambiguous top-level symbol.

use std::sync::OnceLock;

use regex::Regex;
use roam_store::domain::EdgeKind;

use super::RawReference;

fn template_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<template[^>]*>(.*?)</template>").expect("static regex is valid")
    })
}

fn component_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</?([A-Z][A-Za-z0-9]*)[\s/>]").expect("static regex is valid"))
}

fn mustache_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)").expect("static regex is valid")
    })
}

fn directive_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:^|\s)(?:v-bind:|v-on:|:|@)[\w-]+="([A-Za-z_][A-Za-z0-9_]*)"#)
            .expect("static regex is valid")
    })
}

/// Known HTML elements that are never component references, even though
/// a handful (`Template`, none in practice) could collide with the
/// PascalCase heuristic. Kept short since real collisions are rare.
fn is_builtin_element(tag: &str) -> bool {
    tag.chars().next().map(|c| c.is_lowercase()).unwrap_or(true)
}

/// Scans a `.vue` file's raw source (not the script-extracted slice) for
/// template references. Returns an empty vec when no `<template>` block
/// is present. Line numbers are 1-indexed and computed against the full
/// original source, so they line up with script-derived symbols.
pub fn extract_template_references(source: &str, file_path: &str) -> Vec<RawReference> {
    let Some(captures) = template_block_re().captures(source) else {
        return Vec::new();
    };
    let Some(whole) = captures.get(0) else {
        return Vec::new();
    };
    let block_start_byte = whole.start();
    let block = whole.as_str();

    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for caps in component_tag_re().captures_iter(block) {
        let m = caps.get(1).unwrap();
        let name = m.as_str();
        if is_builtin_element(name) {
            continue;
        }
        let line = line_of(source, block_start_byte + m.start());
        if seen.insert((name.to_string(), EdgeKind::Template, line)) {
            out.push(RawReference {
                source_name: None,
                target_name: name.to_string(),
                kind: EdgeKind::Template,
                line,
                source_file: file_path.to_string(),
            });
        }
    }

    for caps in mustache_re().captures_iter(block) {
        let m = caps.get(1).unwrap();
        let name = m.as_str();
        let line = line_of(source, block_start_byte + m.start());
        if seen.insert((name.to_string(), EdgeKind::TemplateRef, line)) {
            out.push(RawReference {
                source_name: None,
                target_name: name.to_string(),
                kind: EdgeKind::TemplateRef,
                line,
                source_file: file_path.to_string(),
            });
        }
    }

    for caps in directive_value_re().captures_iter(block) {
        let m = caps.get(1).unwrap();
        let name = m.as_str();
        let line = line_of(source, block_start_byte + m.start());
        if seen.insert((name.to_string(), EdgeKind::TemplateRef, line)) {
            out.push(RawReference {
                source_name: None,
                target_name: name.to_string(),
                kind: EdgeKind::TemplateRef,
                line,
                source_file: file_path.to_string(),
            });
        }
    }

    out
}

fn line_of(source: &str, byte_offset: usize) -> i64 {
    source
        .as_bytes()
        .iter()
        .take(byte_offset)
        .filter(|&&b| b == b'\n')
        .count() as i64
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_tag_is_a_template_reference() {
        let src = "<template>\n  <UserCard :name=\"user\" />\n</template>\n<script>\n</script>\n";
        let refs = extract_template_references(src, "a.vue");
        assert!(refs
            .iter()
            .any(|r| r.target_name == "UserCard" && r.kind == EdgeKind::Template));
    }

    #[test]
    fn mustache_interpolation_is_a_template_ref_reference() {
        let src = "<template>\n  <div>{{ greeting }}</div>\n</template>\n";
        let refs = extract_template_references(src, "a.vue");
        assert!(refs
            .iter()
            .any(|r| r.target_name == "greeting" && r.kind == EdgeKind::TemplateRef));
    }

    #[test]
    fn directive_binding_value_is_a_template_ref_reference() {
        let src = "<template>\n  <button @click=\"onSave\">Save</button>\n</template>\n";
        let refs = extract_template_references(src, "a.vue");
        assert!(refs
            .iter()
            .any(|r| r.target_name == "onSave" && r.kind == EdgeKind::TemplateRef));
    }

    #[test]
    fn lowercase_tags_are_never_component_references() {
        let src = "<template>\n  <div class=\"wrap\"><span>hi</span></div>\n</template>\n";
        let refs = extract_template_references(src, "a.vue");
        assert!(refs.iter().all(|r| r.kind != EdgeKind::Template));
    }

    #[test]
    fn file_with_no_template_block_yields_nothing() {
        let src = "<script>\nexport default {}\n</script>\n";
        assert!(extract_template_references(src, "a.vue").is_empty());
    }

    #[test]
    fn line_numbers_account_for_preceding_content() {
        let src = "<template>\n\n\n  {{ count }}\n</template>\n";
        let refs = extract_template_references(src, "a.vue");
        let count_ref = refs.iter().find(|r| r.target_name == "count").unwrap();
        assert_eq!(count_ref.line, 4);
    }
}
