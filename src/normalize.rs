//! Chapter payload normalization.
//!
//! Chapter text arrives from the host in one of three shapes: a JSON array
//! of paragraph records, a single JSON object, or a raw markup string.
//! `normalize` converts any of them into paragraph-delimited plain text and
//! never fails: malformed input degrades to best-effort markup stripping,
//! worst case an empty string (the fetcher maps that to a placeholder).

use regex::Regex;
use scraper::{Html, Node};
use serde_json::Value;
use std::sync::LazyLock;

/// Candidate field names probed for chapter text, in priority order.
/// The longest string-valued field is the fallback when none match, which
/// guards against upstream field-name drift.
const CONTENT_FIELDS: [&str; 4] = ["text", "content", "body", "paragraph"];

/// Horizontal whitespace runs collapsed to a single space.
static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\x{A0}]{2,}").unwrap());

/// Whitespace hugging a line break.
static LINE_EDGE_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\x{A0}]*\n[ \t\x{A0}]*").unwrap());

/// Runs of 3+ newlines collapsed to one blank line.
static NEWLINE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Converts a raw chapter payload into paragraph-delimited plain text.
///
/// Paragraphs are separated by exactly one blank line. The result contains
/// no markup tags. Returns an empty string when no text can be recovered.
pub fn normalize(raw: &str) -> String {
    let text = match serde_json::from_str::<Value>(raw) {
        Ok(value) => normalize_value(&value),
        Err(_) => strip_markup(raw),
    };
    collapse_whitespace(&text)
}

/// Normalizes an already-parsed JSON payload.
fn normalize_value(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let mut paragraphs = Vec::new();
            for item in items {
                let fragment = match item {
                    Value::Object(record) => extract_fragment(record)
                        .map(strip_markup)
                        .unwrap_or_default(),
                    Value::String(s) => strip_markup(s),
                    _ => String::new(),
                };
                let fragment = fragment.trim().to_string();
                if !fragment.is_empty() {
                    paragraphs.push(fragment);
                }
            }
            paragraphs.join("\n\n")
        }
        Value::Object(record) => extract_fragment(record)
            .map(strip_markup)
            .unwrap_or_default(),
        Value::String(s) => strip_markup(s),
        _ => String::new(),
    }
}

/// Picks the markup fragment out of a paragraph record.
fn extract_fragment(record: &serde_json::Map<String, Value>) -> Option<&str> {
    for field in CONTENT_FIELDS {
        if let Some(Value::String(s)) = record.get(field) {
            if !s.trim().is_empty() {
                return Some(s);
            }
        }
    }

    // Field names drifted: take the longest string-valued field instead.
    record
        .values()
        .filter_map(Value::as_str)
        .max_by_key(|s| s.len())
}

/// Strips markup from a fragment, keeping line structure.
///
/// `<br>` and block-element boundaries become newlines; consecutive break
/// sources collapse into one. Entities are decoded by the HTML parser.
pub fn strip_markup(fragment: &str) -> String {
    let html = Html::parse_fragment(fragment);
    let mut out = String::new();
    walk(html.tree.root(), &mut out);
    out
}

fn walk(node: ego_tree::NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text.text),
            Node::Element(element) => {
                let name = element.name();
                if matches!(name, "script" | "style" | "head" | "noscript") {
                    continue;
                }
                if name == "br" || name == "hr" {
                    append_break(out);
                    continue;
                }
                if is_block(name) {
                    append_break(out);
                    walk(child, out);
                    append_break(out);
                } else {
                    walk(child, out);
                }
            }
            _ => {}
        }
    }
}

/// Adds a line break unless the output already ends on one.
fn append_break(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "li"
            | "ul"
            | "ol"
            | "dl"
            | "dd"
            | "dt"
            | "blockquote"
            | "pre"
            | "table"
            | "tr"
            | "section"
            | "article"
            | "aside"
            | "header"
            | "footer"
            | "figure"
            | "figcaption"
    )
}

/// Collapses whitespace per the output contract: runs of 2+ horizontal
/// whitespace become one space, runs of 3+ newlines become exactly two,
/// leading/trailing whitespace is trimmed.
fn collapse_whitespace(text: &str) -> String {
    let text = text.replace('\r', "");
    let text = LINE_EDGE_WS.replace_all(&text, "\n");
    let text = HORIZONTAL_WS.replace_all(&text, " ");
    let text = NEWLINE_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_array_joined_by_blank_line() {
        let raw = r#"[{"text":"<p>First paragraph.</p>"},{"text":"<p>Second one.</p>"}]"#;
        assert_eq!(normalize(raw), "First paragraph.\n\nSecond one.");
    }

    #[test]
    fn test_break_and_paragraph_tags() {
        let raw = r#"[{"text":"<p>Hello</p><br>World"}]"#;
        assert_eq!(normalize(raw), "Hello\nWorld");
    }

    #[test]
    fn test_denial_sentinel_is_plain_text() {
        assert_eq!(normalize("Array"), "Array");
    }

    #[test]
    fn test_field_priority_order() {
        let raw = r#"{"content":"from content","text":"from text"}"#;
        assert_eq!(normalize(raw), "from text");

        let raw = r#"{"body":"from body"}"#;
        assert_eq!(normalize(raw), "from body");
    }

    #[test]
    fn test_longest_string_field_fallback() {
        let raw = r#"{"id":"123","prose":"a considerably longer prose value","k":"x"}"#;
        assert_eq!(normalize(raw), "a considerably longer prose value");
    }

    #[test]
    fn test_raw_markup_fallback() {
        let raw = "<div><p>One</p><p>Two</p></div>";
        assert_eq!(normalize(raw), "One\nTwo");
    }

    #[test]
    fn test_empty_fragments_dropped() {
        let raw = r#"[{"text":"<p>   </p>"},{"text":"kept"},{"other":42}]"#;
        assert_eq!(normalize(raw), "kept");
    }

    #[test]
    fn test_no_residual_tags_or_entities() {
        let raw = r#"[{"text":"<p><em>salt</em> &amp; <strong>ash</strong></p>"}]"#;
        let body = normalize(raw);
        assert_eq!(body, "salt & ash");
        assert!(!body.contains('<'));
    }

    #[test]
    fn test_horizontal_whitespace_collapsed() {
        let raw = r#"[{"text":"wide    gaps\tand\t\ttabs"}]"#;
        assert_eq!(normalize(raw), "wide gaps\tand tabs");
    }

    #[test]
    fn test_newline_runs_collapsed() {
        let raw = "line one\n\n\n\n\nline two";
        assert_eq!(normalize(raw), "line one\n\nline two");
    }

    #[test]
    fn test_script_content_skipped() {
        let raw = "<p>visible</p><script>var hidden = 1;</script>";
        assert_eq!(normalize(raw), "visible");
    }

    #[test]
    fn test_empty_input_yields_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("[]"), "");
        assert_eq!(normalize("null"), "");
        assert_eq!(normalize("42"), "");
    }
}
