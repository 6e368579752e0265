//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::SiteConfig;

/// Characters escaped inside a single path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Encode one URL path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Site-relative path of a post page
///
/// # Examples
/// ```ignore
/// post_path(&config, "my-post") // -> "/blog/my-post/"
/// ```
pub fn post_path(config: &SiteConfig, id: &str) -> String {
    format!("{}{}/", blog_path(config), encode_segment(id))
}

/// Site-relative path of the post listing
pub fn blog_path(config: &SiteConfig) -> String {
    let dir = config.blog_dir.trim_matches('/');
    if dir.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", dir)
    }
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/blog/") // -> "https://example.com/blog/"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        config.url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
