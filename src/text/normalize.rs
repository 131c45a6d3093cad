use once_cell::sync::Lazy;
use regex::Regex;

static RE_INLINE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\x0B\x0C]+").unwrap());
static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Collapses the whitespace left behind once markup is removed.
///
/// Runs of spaces and tabs become one space, every line is trimmed, runs of
/// blank lines shrink to a single blank line and the result is trimmed.
pub fn normalize_whitespace(input: &str) -> String {
    let unified = input.replace("\r\n", "\n").replace('\r', "\n");
    let collapsed = RE_INLINE_SPACE.replace_all(&unified, " ");

    let trimmed_lines = collapsed
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");

    RE_BLANK_LINES
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_inline_runs() {
        assert_eq!(normalize_whitespace("Hello \t   World"), "Hello World");
    }

    #[test]
    fn test_trims_lines_and_result() {
        assert_eq!(normalize_whitespace("  one  \n   two\n\n"), "one\ntwo");
    }

    #[test]
    fn test_collapses_blank_lines() {
        assert_eq!(normalize_whitespace("a\n\n\n\n  \n\nb"), "a\n\nb");
        assert_eq!(normalize_whitespace("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_line_endings() {
        assert_eq!(normalize_whitespace("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_whitespace_only() {
        assert_eq!(normalize_whitespace(" \n\t\n "), "");
    }
}
