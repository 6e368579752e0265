//! Show a single rendered post

use anyhow::Result;

use crate::Folio;

/// Print one post by identifier, drafts included
pub async fn run(folio: &Folio, id: &str, json: bool) -> Result<()> {
    print!("{}", render(folio, id, json).await?);
    Ok(())
}

pub async fn render(folio: &Folio, id: &str, json: bool) -> Result<String> {
    let doc = folio.repository().get_document_async(id).await?;

    if json {
        let mut out = serde_json::to_string_pretty(&doc)?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = format!("# {}\n", doc.title());
    if let Some(date) = doc.date() {
        out.push_str(&format!("date: {}\n", date));
    }
    out.push_str(&format!("published: {}\n", doc.front_matter.published));
    if !doc.front_matter.tags.is_empty() {
        out.push_str(&format!("tags: {}\n", doc.front_matter.tags.join(", ")));
    }
    if let Some(summary) = doc.summary() {
        out.push_str(&format!("summary: {}\n", summary));
    }
    out.push('\n');
    out.push_str(&doc.html);
    if !doc.html.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentError;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> (TempDir, Folio) {
        let dir = TempDir::new().unwrap();
        let folio = Folio::new(dir.path()).unwrap();
        fs::create_dir_all(&folio.content_dir).unwrap();
        fs::write(
            folio.content_dir.join("draft.md"),
            "---\ntitle: Draft\ndate: 2024-05-01\ntags: [wip]\n---\nFirst *words*.\n",
        )
        .unwrap();
        (dir, folio)
    }

    #[tokio::test]
    async fn test_show_draft() {
        let (_dir, folio) = site();
        let out = render(&folio, "draft", false).await.unwrap();
        assert!(out.starts_with("# Draft\ndate: 2024-05-01 00:00:00\npublished: false\n"));
        assert!(out.contains("tags: wip\n"));
        assert!(out.contains("summary: First words.\n"));
        assert!(out.contains("<p>First <em>words</em>.</p>"));
    }

    #[tokio::test]
    async fn test_show_json() {
        let (_dir, folio) = site();
        let out = render(&folio, "draft", true).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["id"], "draft");
        assert_eq!(value["published"], false);
        assert!(value["html"].as_str().unwrap().contains("<em>words</em>"));
    }

    #[tokio::test]
    async fn test_show_missing() {
        let (_dir, folio) = site();
        let err = render(&folio, "nope", false).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ContentError>(),
            Some(ContentError::DocumentNotFound { .. })
        ));
    }
}
