//! Create a new post

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::Folio;

/// Create a new post file and return its path.
///
/// The identifier is `slug` when given, otherwise the slugified title. Posts
/// start unpublished unless `publish` is set. Existing files are never
/// overwritten.
pub fn create_post(
    folio: &Folio,
    title: &str,
    slug: Option<&str>,
    publish: bool,
) -> Result<PathBuf> {
    let now = chrono::Local::now();

    let id = match slug {
        Some(s) => slug::slugify(s),
        None => slug::slugify(title),
    };
    if id.is_empty() {
        anyhow::bail!("Cannot derive a file name from {:?}", slug.unwrap_or(title));
    }

    let extension = folio
        .config
        .extensions
        .first()
        .map(|e| e.trim_start_matches('.'))
        .unwrap_or("md");

    fs::create_dir_all(&folio.content_dir)?;

    // Any recognized extension would claim the same identifier
    for ext in &folio.config.extensions {
        let existing = folio
            .content_dir
            .join(format!("{}.{}", id, ext.trim_start_matches('.')));
        if existing.exists() {
            anyhow::bail!("File already exists: {:?}", existing);
        }
    }

    let file_path = folio.content_dir.join(format!("{}.{}", id, extension));

    // Quote the title so YAML never reinterprets it
    let quoted_title = serde_yaml::to_string(title)?;
    let content = format!(
        "---\ntitle: {}\ndate: {}\npublished: {}\n---\n",
        quoted_title.trim_end(),
        now.format("%Y-%m-%d %H:%M:%S"),
        publish
    );

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}
