//! Built-in site templates using the Tera template engine
//!
//! The templates are embedded in the binary; a site needs no theme directory.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{Document, DocumentSummary};
use crate::helpers;

/// Template renderer with the embedded site layout
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        // Tera::default() autoescapes .html templates; post bodies use `| safe`
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("post_list.html", include_str!("site/post_list.html")),
            ("index.html", include_str!("site/index.html")),
            ("blog.html", include_str!("site/blog.html")),
            ("post.html", include_str!("site/post.html")),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    Ok(tera::Value::String(helpers::truncate(&s, length, None)))
}

/// Site-wide values available to every template as `config`
#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub url: String,
    pub blog_path: String,
    pub feed_url: String,
}

impl ConfigData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            language: config.language.clone(),
            url: config.url.clone(),
            blog_path: helpers::blog_path(config),
            feed_url: helpers::full_url_for(config, "feed.xml"),
        }
    }
}

/// A post as the templates see it
#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub id: String,
    pub title: String,
    /// Display date in the configured format
    pub date: Option<String>,
    pub date_iso: Option<String>,
    pub path: String,
    pub permalink: String,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    /// Rendered HTML; empty for listing entries
    pub content: String,
}

impl PostData {
    /// Listing entry built from a summary
    pub fn from_summary(summary: &DocumentSummary, config: &SiteConfig) -> Self {
        let date = summary.date();
        let path = helpers::post_path(config, &summary.id);
        Self {
            id: summary.id.clone(),
            title: summary.title().to_string(),
            date: date.map(|d| helpers::format_date(&d, &config.date_format)),
            date_iso: date.map(|d| helpers::date_xml(&d)),
            permalink: helpers::full_url_for(config, &path),
            path,
            description: summary.front_matter.description.clone(),
            cover_image: summary
                .front_matter
                .cover_image
                .as_deref()
                .map(|img| helpers::full_url_for(config, img)),
            tags: summary.front_matter.tags.clone(),
            published: summary.front_matter.published,
            content: String::new(),
        }
    }

    /// Full post page, description falling back to the excerpt
    pub fn from_document(doc: &Document, config: &SiteConfig) -> Self {
        let mut data = Self::from_summary(&DocumentSummary::from(doc), config);
        data.description = doc.summary().map(str::to_string);
        data.content = doc.html.clone();
        data
    }
}
