//! Generator module - writes HTML pages, the RSS feed and the sitemap

mod feed;
mod sitemap;

use anyhow::{Context as _, Result};
use chrono::Datelike;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tera::Context;
use walkdir::WalkDir;

use crate::content::repository::sort_newest_first;
use crate::content::{ContentRepository, Document, DocumentSummary};
use crate::helpers;
use crate::templates::{ConfigData, PostData, TemplateRenderer};
use crate::Folio;

pub use feed::build_rss;
pub use sitemap::build_sitemap;

/// Outcome of a build pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Post pages written, drafts included
    pub pages: usize,
    /// Posts listed publicly
    pub published: usize,
    /// Identifiers that failed to load, with the reason
    pub failed: Vec<(String, String)>,
}

/// Static site generator using the built-in templates
pub struct Generator {
    folio: Folio,
    repository: ContentRepository,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(folio: &Folio) -> Result<Self> {
        Ok(Self {
            folio: folio.clone(),
            repository: folio.repository(),
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Generate the entire site.
    ///
    /// A post that fails to load is reported and skipped. Only an unreadable
    /// content directory or a duplicate identifier aborts the build.
    pub async fn generate(&self) -> Result<BuildReport> {
        let public_dir = &self.folio.public_dir;
        fs::create_dir_all(public_dir)
            .with_context(|| format!("failed to create {:?}", public_dir))?;

        self.copy_static_assets()?;

        let loaded = self.repository.load_all().await?;

        let mut report = BuildReport::default();
        let mut documents: HashMap<String, Document> = HashMap::new();
        let mut published = Vec::new();

        for (id, result) in loaded {
            match result {
                Ok(doc) => {
                    self.generate_post_page(&doc)?;
                    report.pages += 1;
                    if doc.front_matter.published {
                        published.push(DocumentSummary::from(&doc));
                    }
                    documents.insert(id, doc);
                }
                Err(e) => {
                    tracing::warn!("Skipping post {}: {}", e.subject(), e);
                    report.failed.push((id, e.to_string()));
                }
            }
        }

        // Same order as list_published, over the posts that loaded
        let summaries = sort_newest_first(published);
        report.published = summaries.len();
        tracing::info!(
            "Loaded {} posts ({} published, {} failed)",
            documents.len(),
            summaries.len(),
            report.failed.len()
        );

        self.generate_index_page(&summaries)?;
        self.generate_blog_page(&summaries)?;

        // Listing order, limited to posts that rendered
        let feed_docs: Vec<&Document> = summaries
            .iter()
            .filter_map(|s| documents.get(&s.id))
            .collect();
        let rss = build_rss(&self.folio.config, &feed_docs);
        self.write_output(Path::new("feed.xml"), &rss)?;
        tracing::info!("Generated feed.xml");

        let sitemap = build_sitemap(&self.folio.config, &summaries);
        self.write_output(Path::new("sitemap.xml"), &sitemap)?;
        tracing::info!("Generated sitemap.xml");

        Ok(report)
    }

    fn base_context(&self, canonical_path: &str) -> Context {
        let config = &self.folio.config;
        let mut context = Context::new();
        context.insert("config", &ConfigData::from_config(config));
        context.insert("canonical", &helpers::full_url_for(config, canonical_path));
        context.insert("year", &chrono::Local::now().year());
        context
    }

    /// Home page with the latest posts
    fn generate_index_page(&self, summaries: &[DocumentSummary]) -> Result<()> {
        let config = &self.folio.config;
        let posts: Vec<PostData> = summaries
            .iter()
            .take(config.home_posts)
            .map(|s| PostData::from_summary(s, config))
            .collect();

        let mut context = self.base_context("/");
        context.insert("posts", &posts);

        let html = self.renderer.render("index.html", &context)?;
        self.write_output(Path::new("index.html"), &html)
    }

    /// Full listing of published posts
    fn generate_blog_page(&self, summaries: &[DocumentSummary]) -> Result<()> {
        let config = &self.folio.config;
        let posts: Vec<PostData> = summaries
            .iter()
            .map(|s| PostData::from_summary(s, config))
            .collect();

        let blog_path = helpers::blog_path(config);
        let mut context = self.base_context(&blog_path);
        context.insert("posts", &posts);
        context.insert("page_title", "Blog");

        let html = self.renderer.render("blog.html", &context)?;
        // With blog_dir at the root this replaces the home page
        let output = Path::new(blog_path.trim_matches('/')).join("index.html");
        self.write_output(&output, &html)
    }

    /// One page per post, reachable by direct link even when unpublished
    fn generate_post_page(&self, doc: &Document) -> Result<()> {
        let config = &self.folio.config;
        let post = PostData::from_document(doc, config);

        let mut context = self.base_context(&post.path);
        context.insert("post", &post);
        context.insert("page_title", &post.title);
        context.insert("page_description", &post.description);
        context.insert("og_image", &post.cover_image);

        let html = self
            .renderer
            .render("post.html", &context)
            .with_context(|| format!("failed to render page for {}", doc.id))?;

        let output = Path::new(helpers::blog_path(config).trim_matches('/'))
            .join(&doc.id)
            .join("index.html");
        self.write_output(&output, &html)?;
        tracing::debug!("Generated {:?}", output);
        Ok(())
    }

    fn write_output(&self, relative: &Path, contents: &str) -> Result<()> {
        let dest = self.folio.public_dir.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, contents).with_context(|| format!("failed to write {:?}", dest))?;
        Ok(())
    }

    /// Copy static assets (images, etc.) to public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = self.folio.base_dir.join(&self.folio.config.static_dir);
        if !static_dir.is_dir() {
            return Ok(());
        }

        let mut copied = 0usize;
        for entry in WalkDir::new(&static_dir).follow_links(true) {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = path.strip_prefix(&static_dir)?;
            let dest = self.folio.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest).with_context(|| format!("failed to copy {:?}", path))?;
            copied += 1;
        }

        tracing::debug!("Copied {} static files", copied);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    fn site(files: &[(&str, &str)]) -> (TempDir, Folio) {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig {
            url: "https://ruheni.dev".to_string(),
            ..SiteConfig::default()
        };
        let folio = Folio::with_config(dir.path(), config);
        fs::create_dir_all(&folio.content_dir).unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        (dir, folio)
    }

    #[tokio::test]
    async fn test_generate_site() {
        let (_dir, folio) = site(&[
            (
                "posts/hello.md",
                "---\ntitle: Hello\ndate: 2024-01-01\npublished: true\n---\n# Hi\n\nHello **world**.",
            ),
            (
                "posts/secret.md",
                "---\ntitle: Secret\ndate: 2024-02-01\n---\nNot listed.",
            ),
            ("static/images/logo.svg", "<svg/>"),
        ]);

        let report = Generator::new(&folio).unwrap().generate().await.unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(report.published, 1);
        assert!(report.failed.is_empty());

        let public = &folio.public_dir;
        let post = fs::read_to_string(public.join("blog/hello/index.html")).unwrap();
        assert!(post.contains("<strong>world</strong>"));

        // Drafts get a page but are not listed anywhere
        assert!(public.join("blog/secret/index.html").exists());
        let blog = fs::read_to_string(public.join("blog/index.html")).unwrap();
        assert!(blog.contains("/blog/hello/"));
        assert!(!blog.contains("Secret"));

        let feed = fs::read_to_string(public.join("feed.xml")).unwrap();
        assert!(feed.contains("<link>https://ruheni.dev/blog/hello/</link>"));
        assert!(!feed.contains("secret"));

        let sitemap = fs::read_to_string(public.join("sitemap.xml")).unwrap();
        assert!(sitemap.contains("<loc>https://ruheni.dev/blog/hello/</loc>"));
        assert!(!sitemap.contains("secret"));

        assert!(public.join("index.html").exists());
        assert!(public.join("images/logo.svg").exists());
    }

    #[tokio::test]
    async fn test_malformed_post_is_skipped() {
        let (_dir, folio) = site(&[
            (
                "posts/good.md",
                "---\ntitle: Good\ndate: 2024-01-01\npublished: true\n---\nFine.",
            ),
            ("posts/bad.md", "---\ntitle: [oops\npublished: true\n---\nBroken."),
        ]);

        let report = Generator::new(&folio).unwrap().generate().await.unwrap();
        assert_eq!(report.pages, 1);
        assert_eq!(report.published, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "bad");
        assert!(report.failed[0].1.contains("bad.md"));

        let public = &folio.public_dir;
        assert!(public.join("blog/good/index.html").exists());
        assert!(!public.join("blog/bad/index.html").exists());
        let blog = fs::read_to_string(public.join("blog/index.html")).unwrap();
        assert!(blog.contains("/blog/good/"));
        let feed = fs::read_to_string(public.join("feed.xml")).unwrap();
        assert!(feed.contains("/blog/good/"));
        assert!(!feed.contains("/blog/bad/"));
    }

    #[tokio::test]
    async fn test_listing_order_matches_repository() {
        let (_dir, folio) = site(&[
            ("posts/a.md", "---\ntitle: A\ndate: 2024-01-01\npublished: true\n---\nA"),
            ("posts/b.md", "---\ntitle: B\ndate: 2024-6-1\npublished: true\n---\nB"),
            ("posts/c.md", "---\ntitle: C\npublished: true\n---\nC"),
        ]);

        Generator::new(&folio).unwrap().generate().await.unwrap();

        let blog = fs::read_to_string(folio.public_dir.join("blog/index.html")).unwrap();
        let pos = |id: &str| blog.find(&format!("/blog/{}/", id)).unwrap();
        assert!(pos("b") < pos("a"));
        assert!(pos("a") < pos("c"));

        let expected: Vec<_> = folio
            .repository()
            .list_published()
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(expected, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_missing_content_dir_aborts() {
        let dir = TempDir::new().unwrap();
        let folio = Folio::with_config(dir.path(), SiteConfig::default());
        assert!(Generator::new(&folio).unwrap().generate().await.is_err());
    }
}
