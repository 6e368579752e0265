//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    /// IANA timezone name used for feed dates (empty means UTC)
    pub timezone: String,

    // URL
    pub url: String,
    /// Path segment under which posts are published (`/blog/<id>/`)
    pub blog_dir: String,

    // Directory
    pub content_dir: String,
    pub public_dir: String,
    /// Files copied verbatim into the public directory
    pub static_dir: String,

    // Writing
    /// File extensions recognized as posts, without the leading dot
    pub extensions: Vec<String>,
    pub excerpt_separator: String,
    #[serde(default)]
    pub highlight: HighlightConfig,
    /// Upper bound on a single document render, in seconds (0 disables)
    pub render_timeout_secs: u64,

    // Output
    pub date_format: String,
    pub feed_limit: usize,
    /// Number of posts shown on the home page
    pub home_posts: usize,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            description: String::new(),
            author: "John Doe".to_string(),
            language: "en".to_string(),
            timezone: String::new(),

            url: "http://example.com".to_string(),
            blog_dir: "blog".to_string(),

            content_dir: "posts".to_string(),
            public_dir: "public".to_string(),
            static_dir: "static".to_string(),

            extensions: vec!["md".to_string(), "markdown".to_string()],
            excerpt_separator: "<!-- more -->".to_string(),
            highlight: HighlightConfig::default(),
            render_timeout_secs: 30,

            date_format: "MMMM D, YYYY".to_string(),
            feed_limit: 20,
            home_posts: 5,

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// Resolve the configured timezone, falling back to UTC
    pub fn tz(&self) -> chrono_tz::Tz {
        if self.timezone.trim().is_empty() {
            return chrono_tz::UTC;
        }
        match self.timezone.parse::<chrono_tz::Tz>() {
            Ok(tz) => tz,
            Err(e) => {
                tracing::warn!("Unknown timezone {:?} ({}), using UTC", self.timezone, e);
                chrono_tz::UTC
            }
        }
    }

    /// Render timeout, if enabled
    pub fn render_timeout(&self) -> Option<std::time::Duration> {
        (self.render_timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(self.render_timeout_secs))
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    pub line_number: bool,
    /// syntect theme name
    pub theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            line_number: false,
            theme: "base16-ocean.dark".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let yaml = r#"
title: Alex Ruheni
url: https://ruheni.dev
highlight:
  line_number: true
twitter: ruheni_alex
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Alex Ruheni");
        assert_eq!(config.content_dir, "posts");
        assert_eq!(config.extensions, vec!["md", "markdown"]);
        assert!(config.highlight.enable);
        assert!(config.highlight.line_number);
        assert!(config.extra.contains_key("twitter"));
    }

    #[test]
    fn test_timezone_fallback() {
        let mut config = SiteConfig::default();
        assert_eq!(config.tz(), chrono_tz::UTC);

        config.timezone = "Africa/Nairobi".to_string();
        assert_eq!(config.tz(), chrono_tz::Africa::Nairobi);

        config.timezone = "Mars/Olympus".to_string();
        assert_eq!(config.tz(), chrono_tz::UTC);
    }

    #[test]
    fn test_render_timeout_zero_disables() {
        let mut config = SiteConfig::default();
        assert_eq!(
            config.render_timeout(),
            Some(std::time::Duration::from_secs(30))
        );
        config.render_timeout_secs = 0;
        assert_eq!(config.render_timeout(), None);
    }
}
