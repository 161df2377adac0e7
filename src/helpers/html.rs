//! HTML text helpers

/// Escape HTML special characters
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Strip HTML tags from content
pub fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

/// Truncate by character count, appending `omission` when cut
pub fn truncate_chars(s: &str, length: usize, omission: &str) -> String {
    if s.chars().count() <= length {
        return s.to_string();
    }

    let truncated: String = s.chars().take(length).collect();
    format!("{}{}", truncated.trim_end(), omission)
}
