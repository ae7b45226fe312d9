use unicode_normalization::UnicodeNormalization;

pub const MAX_FILENAME_CHARS: usize = 100;
pub const DEFAULT_FILENAME: &str = "document";

/// Turn a document title into a safe file stem: NFKC-normalized, control and
/// path-hostile characters removed, whitespace runs collapsed to `-`, at most
/// [`MAX_FILENAME_CHARS`] characters.
pub fn sanitize_filename(title: &str) -> String {
    let cleaned: String = title
        .nfkc()
        .filter(|c| !c.is_control() && !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect();
    let hyphenated = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
    let truncated: String = hyphenated.chars().take(MAX_FILENAME_CHARS).collect();
    let trimmed = truncated.trim_matches(|c| c == '.' || c == '-');
    if trimmed.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// `<sanitized title>.pdf`
pub fn suggested_filename(title: &str) -> String {
    format!("{}.pdf", sanitize_filename(title))
}
