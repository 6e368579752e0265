//! sitemap.xml

use crate::config::SiteConfig;
use crate::content::DocumentSummary;
use crate::helpers::{blog_path, date_xml, escape_xml, full_url_for, post_path};

/// Site root, the post listing and every published post
pub fn build_sitemap(config: &SiteConfig, posts: &[DocumentSummary]) -> String {
    let mut urls: Vec<(String, Option<String>)> = vec![(full_url_for(config, "/"), None)];
    let listing = full_url_for(config, &blog_path(config));
    if !urls.iter().any(|(loc, _)| *loc == listing) {
        urls.push((listing, None));
    }
    urls.extend(posts.iter().map(|post| {
        (
            full_url_for(config, &post_path(config, &post.id)),
            post.date().map(|d| date_xml(&d)),
        )
    }));

    let mut sitemap = String::new();
    sitemap.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    sitemap.push('\n');
    sitemap.push_str(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#);
    sitemap.push('\n');
    for (loc, lastmod) in urls {
        sitemap.push_str("  <url>\n");
        sitemap.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&loc)));
        if let Some(lastmod) = lastmod {
            sitemap.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod));
        }
        sitemap.push_str("  </url>\n");
    }
    sitemap.push_str("</urlset>\n");
    sitemap
}
