use crate::fonts::FontFace;

/// Width of `text` set in `face` at `size` points.
pub fn measure(text: &str, face: &FontFace, size: f32) -> f32 {
    face.text_width(text, size)
}

/// Greedy word wrap. Words are never split: a word wider than `max_width`
/// gets a line of its own and overflows.
pub fn wrap(text: &str, face: &FontFace, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure(&candidate, face, size) <= max_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = word.to_string();
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Split on runs of newlines; blank lines separate paragraphs rather than
/// producing empty ones.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    text.split(['\n', '\r'])
        .filter(|p| !p.trim().is_empty())
        .collect()
}
