//! List site content

use anyhow::Result;
use indexmap::IndexMap;
use serde::Serialize;

use crate::content::DocumentSummary;
use crate::helpers::date_xml;
use crate::Folio;

#[derive(Serialize)]
struct TagCount<'a> {
    name: &'a str,
    count: usize,
}

/// Print site content by type
pub fn run(folio: &Folio, content_type: &str, json: bool) -> Result<()> {
    print!("{}", render(folio, content_type, json)?);
    Ok(())
}

/// Build the listing output for `content_type`
pub fn render(folio: &Folio, content_type: &str, json: bool) -> Result<String> {
    let repo = folio.repository();
    let mut out = String::new();

    match content_type {
        "post" | "posts" => {
            let posts = repo.list_published()?;
            if json {
                return Ok(to_json(&posts)?);
            }
            out.push_str(&format!("Posts ({}):\n", posts.len()));
            for post in &posts {
                out.push_str(&summary_line(post));
            }
        }
        "id" | "ids" => {
            let ids = repo.list_identifiers()?;
            if json {
                return Ok(to_json(&ids)?);
            }
            for id in ids {
                out.push_str(&id);
                out.push('\n');
            }
        }
        "draft" | "drafts" => {
            // Drafts are every identifier missing from the published listing
            let published: Vec<String> =
                repo.list_published()?.into_iter().map(|s| s.id).collect();
            let drafts: Vec<String> = repo
                .list_identifiers()?
                .into_iter()
                .filter(|id| !published.contains(id))
                .collect();
            if json {
                return Ok(to_json(&drafts)?);
            }
            out.push_str(&format!("Drafts ({}):\n", drafts.len()));
            for id in drafts {
                out.push_str(&format!("  {}\n", id));
            }
        }
        "tag" | "tags" => {
            let posts = repo.list_published()?;
            let mut tags: IndexMap<&str, usize> = IndexMap::new();
            for post in &posts {
                for tag in &post.front_matter.tags {
                    *tags.entry(tag.as_str()).or_insert(0) += 1;
                }
            }
            // Most used first, ties in order of first appearance
            let mut tags: Vec<TagCount> = tags
                .into_iter()
                .map(|(name, count)| TagCount { name, count })
                .collect();
            tags.sort_by(|a, b| b.count.cmp(&a.count));

            if json {
                return Ok(to_json(&tags)?);
            }
            out.push_str(&format!("Tags ({}):\n", tags.len()));
            for tag in tags {
                out.push_str(&format!("  {} ({})\n", tag.name, tag.count));
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: posts, ids, drafts, tags",
                content_type
            );
        }
    }

    Ok(out)
}

fn summary_line(post: &DocumentSummary) -> String {
    let date = post
        .date()
        .map(|d| date_xml(&d))
        .unwrap_or_else(|| "----------".to_string());
    format!("  {} - {} [{}]\n", date, post.title(), post.id)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}
