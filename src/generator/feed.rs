//! RSS 2.0 feed

use crate::config::SiteConfig;
use crate::content::Document;
use crate::helpers::{
    absolutize_urls, date_rfc2822, escape_xml, full_url_for, post_path, strip_invalid_xml_chars,
};

/// Build the RSS document for `posts`, which are expected newest first.
///
/// Only the first `feed_limit` posts are included. `lastBuildDate` is the
/// newest post date, so rebuilding unchanged content gives the same bytes.
pub fn build_rss(config: &SiteConfig, posts: &[&Document]) -> String {
    let tz = config.tz();
    let site_url = full_url_for(config, "/");
    let feed_url = full_url_for(config, "feed.xml");

    let mut feed = String::new();
    feed.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    feed.push('\n');
    feed.push_str(r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:content="http://purl.org/rss/1.0/modules/content/">"#);
    feed.push('\n');
    feed.push_str("<channel>\n");
    feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
    feed.push_str(&format!("  <link>{}</link>\n", escape_xml(&site_url)));
    feed.push_str(&format!(
        "  <description>{}</description>\n",
        escape_xml(&config.description)
    ));
    feed.push_str(&format!(
        "  <language>{}</language>\n",
        escape_xml(&config.language)
    ));
    feed.push_str(&format!(
        "  <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>\n",
        escape_xml(&feed_url)
    ));
    if let Some(newest) = posts.iter().filter_map(|p| p.date()).max() {
        feed.push_str(&format!(
            "  <lastBuildDate>{}</lastBuildDate>\n",
            date_rfc2822(&newest, &tz)
        ));
    }

    for post in posts.iter().take(config.feed_limit) {
        let link = full_url_for(config, &post_path(config, &post.id));

        feed.push_str("  <item>\n");
        feed.push_str(&format!("    <title>{}</title>\n", escape_xml(post.title())));
        feed.push_str(&format!("    <link>{}</link>\n", escape_xml(&link)));
        feed.push_str(&format!(
            "    <guid isPermaLink=\"true\">{}</guid>\n",
            escape_xml(&link)
        ));
        if let Some(date) = post.date() {
            feed.push_str(&format!(
                "    <pubDate>{}</pubDate>\n",
                date_rfc2822(&date, &tz)
            ));
        }
        if let Some(summary) = post.summary() {
            feed.push_str(&format!(
                "    <description>{}</description>\n",
                escape_xml(&strip_invalid_xml_chars(summary))
            ));
        }
        for tag in &post.front_matter.tags {
            feed.push_str(&format!("    <category>{}</category>\n", escape_xml(tag)));
        }
        // CDATA cannot contain its own terminator
        let content = absolutize_urls(&post.html, &config.url).replace("]]>", "]]]]><![CDATA[>");
        feed.push_str(&format!(
            "    <content:encoded><![CDATA[{}]]></content:encoded>\n",
            strip_invalid_xml_chars(&content)
        ));
        feed.push_str("  </item>\n");
    }

    feed.push_str("</channel>\n");
    feed.push_str("</rss>\n");
    feed
}
