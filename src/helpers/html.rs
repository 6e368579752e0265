//! HTML and XML text helpers

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"(?s)<!--.*?-->|<[^>]*>").unwrap();
    static ref SPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Escape XML special characters
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Strip HTML tags and comments, collapsing whitespace
pub fn strip_html(s: &str) -> String {
    let text = TAG_RE.replace_all(s, " ");
    SPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Truncate a string to a specified length in characters
pub fn truncate(s: &str, length: usize, omission: Option<&str>) -> String {
    let omission = omission.unwrap_or("...");

    if s.chars().count() <= length {
        s.to_string()
    } else {
        let truncated: String = s
            .chars()
            .take(length.saturating_sub(omission.chars().count()))
            .collect();
        format!("{}{}", truncated.trim_end(), omission)
    }
}

/// Strip invalid XML control characters (except tab, newline, carriage return)
/// XML 1.0 only allows: #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
pub fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}

/// Make root-relative `href`/`src` attributes absolute, for feed readers
pub fn absolutize_urls(content: &str, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    content
        .replace("href=\"/", &format!("href=\"{}/", base))
        .replace("src=\"/", &format!("src=\"{}/", base))
        .replace("href='/", &format!("href='{}/", base))
        .replace("src='/", &format!("src='{}/", base))
}
