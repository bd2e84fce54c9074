//! Utility functions for common operations.

/// Builds a filesystem- and header-safe filename from a story title.
///
/// Keeps alphanumerics, spaces, hyphens and underscores; everything else is
/// dropped. Runs of spaces become single underscores. Falls back to "story"
/// when nothing survives.
pub fn sanitize_filename(title: &str) -> String {
    let kept: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else if c.is_whitespace() {
                ' '
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect();

    let joined = kept.split_whitespace().collect::<Vec<_>>().join("_");
    if joined.is_empty() {
        "story".to_string()
    } else {
        joined
    }
}

/// Truncates text to at most `limit` characters, appending an ellipsis when
/// anything was cut. Counts characters, not bytes, so multibyte text is
/// never split mid-codepoint.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let mut cut: String = text.chars().take(limit).collect();
    // Drop a trailing partial word so the ellipsis lands on a boundary.
    if let Some(pos) = cut.rfind(char::is_whitespace) {
        cut.truncate(pos);
    }
    let mut cut = cut.trim_end().to_string();
    cut.push('\u{2026}');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_title() {
        assert_eq!(sanitize_filename("My Story"), "My_Story");
    }

    #[test]
    fn test_sanitize_strips_punctuation() {
        assert_eq!(
            sanitize_filename("The Heir: Book #2 (complete!)"),
            "The_Heir_Book_2_complete"
        );
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_filename("???"), "story");
        assert_eq!(sanitize_filename(""), "story");
    }

    #[test]
    fn test_sanitize_keeps_unicode_letters() {
        assert_eq!(sanitize_filename("café noir"), "café_noir");
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_cuts_on_word_boundary() {
        let text = "one two three four";
        let cut = truncate_chars(text, 9);
        assert_eq!(cut, "one two\u{2026}");
    }

    #[test]
    fn test_truncate_multibyte_safe() {
        let text = "あいうえおかきくけこ";
        let cut = truncate_chars(text, 4);
        assert!(cut.starts_with("あいうえ"));
        assert!(cut.ends_with('\u{2026}'));
    }
}
