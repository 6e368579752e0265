//! Content repository - lists and loads posts from the content directory
//!
//! Every call reads the directory afresh; nothing is cached between calls.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinError;
use walkdir::WalkDir;

use super::{ContentError, Document, DocumentSummary, FrontMatter, MarkdownRenderer};
use crate::Folio;

/// Markdown documents in a single directory, addressed by file stem
#[derive(Clone)]
pub struct ContentRepository {
    dir: PathBuf,
    extensions: Vec<String>,
    renderer: Arc<MarkdownRenderer>,
    render_timeout: Option<Duration>,
}

/// Front-matter and body of a file that has not been rendered yet
struct Source {
    path: PathBuf,
    front_matter: FrontMatter,
    body: String,
}

impl ContentRepository {
    /// Create a repository over `dir`, recognizing the given extensions
    pub fn new<P: AsRef<Path>>(
        dir: P,
        extensions: &[String],
        renderer: Arc<MarkdownRenderer>,
    ) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect(),
            renderer,
            render_timeout: None,
        }
    }

    /// Create a repository for the site's configured content directory
    pub fn from_site(folio: &Folio) -> Self {
        let renderer = Arc::new(MarkdownRenderer::from_config(&folio.config));
        Self::new(&folio.content_dir, &folio.config.extensions, renderer)
            .with_render_timeout(folio.config.render_timeout())
    }

    /// Bound the render step of [`get_document_async`](Self::get_document_async)
    pub fn with_render_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.render_timeout = timeout;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Published posts, newest first
    pub fn list_published(&self) -> Result<Vec<DocumentSummary>, ContentError> {
        let mut published = Vec::new();

        for (id, path) in self.entries()? {
            let source = self.read_source(&path)?;
            if !source.front_matter.published {
                tracing::debug!("Skipping unpublished post {}", id);
                continue;
            }
            published.push(DocumentSummary {
                id,
                front_matter: source.front_matter,
            });
        }

        Ok(sort_newest_first(published))
    }

    /// Identifiers of every post, published or not, in directory order
    pub fn list_identifiers(&self) -> Result<Vec<String>, ContentError> {
        Ok(self.entries()?.into_iter().map(|(id, _)| id).collect())
    }

    /// Load and render a single post. Unpublished posts are returned too.
    pub fn get_document(&self, id: &str) -> Result<Document, ContentError> {
        let source = self.load(id)?;
        Ok(render(&self.renderer, id, source))
    }

    /// Same as [`get_document`](Self::get_document), with the render step run
    /// on the blocking pool under the configured timeout
    pub async fn get_document_async(&self, id: &str) -> Result<Document, ContentError> {
        let source = self.load(id)?;

        let renderer = Arc::clone(&self.renderer);
        let owned_id = id.to_string();
        let task = tokio::task::spawn_blocking(move || render(&renderer, &owned_id, source));

        bounded_render(id, self.render_timeout, task).await
    }

    /// Load every post concurrently.
    ///
    /// A failure of one post is reported in its slot and does not stop the
    /// others. Results follow [`list_identifiers`](Self::list_identifiers) order.
    pub async fn load_all(
        &self,
    ) -> Result<Vec<(String, Result<Document, ContentError>)>, ContentError> {
        let handles: Vec<_> = self
            .list_identifiers()?
            .into_iter()
            .map(|id| {
                let repo = self.clone();
                let task_id = id.clone();
                let handle = tokio::spawn(async move { repo.get_document_async(&task_id).await });
                (id, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(ContentError::MarkdownRender {
                    id: id.clone(),
                    message: e.to_string(),
                }),
            };
            results.push((id, result));
        }

        Ok(results)
    }

    /// Content files in the directory as (identifier, path), sorted by file
    /// name. Fails if two files map to one identifier.
    fn entries(&self) -> Result<Vec<(String, PathBuf)>, ContentError> {
        let unavailable = |source: io::Error| ContentError::DirectoryUnavailable {
            path: self.dir.clone(),
            source,
        };

        let metadata = fs::metadata(&self.dir).map_err(unavailable)?;
        if !metadata.is_dir() {
            return Err(unavailable(io::Error::other("not a directory")));
        }

        let mut entries = Vec::new();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| unavailable(e.into()))?;
            let path = entry.path();

            if !entry.file_type().is_file() {
                continue;
            }
            let Some(id) = self.identifier_for(path) else {
                tracing::debug!("Ignoring non-content file {:?}", path);
                continue;
            };

            if let Some(first) = seen.get(&id) {
                return Err(ContentError::DuplicateIdentifier {
                    id,
                    first: first.clone(),
                    second: path.to_path_buf(),
                });
            }
            seen.insert(id.clone(), path.to_path_buf());
            entries.push((id, path.to_path_buf()));
        }

        Ok(entries)
    }

    /// File stem when the file carries a content extension
    fn identifier_for(&self, path: &Path) -> Option<String> {
        let name = path.file_name()?.to_str()?;
        if name.starts_with('.') {
            return None;
        }
        let id = self.extensions.iter().find_map(|ext| {
            name.strip_suffix(ext.as_str())
                .and_then(|stem| stem.strip_suffix('.'))
                .filter(|stem| !stem.is_empty())
        })?;

        // Listed identifiers must resolve through get_document
        if !is_plain_identifier(id) {
            tracing::debug!("Ignoring {:?}: {:?} is not a usable identifier", path, id);
            return None;
        }
        Some(id.to_string())
    }

    /// Path of the file holding `id`
    fn resolve(&self, id: &str) -> Result<PathBuf, ContentError> {
        let not_found = || ContentError::DocumentNotFound {
            id: id.to_string(),
            path: self.dir.join(id),
        };

        if !is_plain_identifier(id) {
            return Err(not_found());
        }

        let mut candidates = self
            .extensions
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", id, ext)))
            .filter(|path| path.is_file());

        let first = candidates.next().ok_or_else(not_found)?;
        if let Some(second) = candidates.next() {
            return Err(ContentError::DuplicateIdentifier {
                id: id.to_string(),
                first,
                second,
            });
        }
        Ok(first)
    }

    fn load(&self, id: &str) -> Result<Source, ContentError> {
        let path = self.resolve(id)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            tracing::debug!("Cannot read {:?}: {}", path, e);
            ContentError::DocumentNotFound {
                id: id.to_string(),
                path: path.clone(),
            }
        })?;
        parse_source(path, &content)
    }

    fn read_source(&self, path: &Path) -> Result<Source, ContentError> {
        let content = fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_source(path.to_path_buf(), &content)
    }
}

/// Await a render task, turning expiry and task failure into `MarkdownRender`
async fn bounded_render<F>(
    id: &str,
    limit: Option<Duration>,
    task: F,
) -> Result<Document, ContentError>
where
    F: Future<Output = Result<Document, JoinError>>,
{
    let joined = match limit {
        Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
            ContentError::MarkdownRender {
                id: id.to_string(),
                message: format!("render timed out after {:?}", limit),
            }
        })?,
        None => task.await,
    };

    joined.map_err(|e| ContentError::MarkdownRender {
        id: id.to_string(),
        message: e.to_string(),
    })
}

/// Sort by parsed date, newest first. Stable: equal dates keep their input
/// order and undated posts go last.
pub(crate) fn sort_newest_first(mut summaries: Vec<DocumentSummary>) -> Vec<DocumentSummary> {
    for summary in summaries.iter().filter(|s| s.date().is_none()) {
        tracing::debug!(
            "Post {} has no usable date ({:?}), listing it last",
            summary.id,
            summary.front_matter.date
        );
    }
    summaries.sort_by_cached_key(|s| Reverse(s.date()));
    summaries
}

fn parse_source(path: PathBuf, content: &str) -> Result<Source, ContentError> {
    match FrontMatter::parse(content) {
        Ok((front_matter, body)) => Ok(Source {
            body: body.to_string(),
            front_matter,
            path,
        }),
        Err(e) => Err(ContentError::FrontMatterParse {
            path,
            message: e.to_string(),
        }),
    }
}

fn render(renderer: &MarkdownRenderer, id: &str, source: Source) -> Document {
    let html = renderer.render(&source.body);
    let excerpt = match source.front_matter.description {
        Some(_) => None,
        None => renderer.excerpt(&source.body),
    };

    Document {
        id: id.to_string(),
        front_matter: source.front_matter,
        body: source.body,
        excerpt,
        html,
        source: source.path,
    }
}

/// A bare file stem: no separators, no dot segments, not hidden
fn is_plain_identifier(id: &str) -> bool {
    !id.is_empty()
        && !id.starts_with('.')
        && !id.contains(['/', '\\', '\0'])
        && Path::new(id).components().count() == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn post(title: &str, date: &str, published: bool, body: &str) -> String {
        format!(
            "---\ntitle: {}\ndate: {}\npublished: {}\n---\n\n{}",
            title, date, published, body
        )
    }

    fn fixture(files: &[(&str, String)]) -> (TempDir, ContentRepository) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let repo = ContentRepository::new(
            dir.path(),
            &["md".to_string(), "markdown".to_string()],
            Arc::new(MarkdownRenderer::new()),
        );
        (dir, repo)
    }

    #[test]
    fn test_list_published_sorted_newest_first() {
        let (_dir, repo) = fixture(&[
            ("a.md", post("A", "2024-01-01", true, "a")),
            ("b.md", post("B", "2024-06-15", true, "b")),
            ("c.md", post("C", "2023-12-31", true, "c")),
        ]);

        let dates: Vec<_> = repo
            .list_published()
            .unwrap()
            .into_iter()
            .map(|s| s.front_matter.date.unwrap())
            .collect();
        assert_eq!(dates, vec!["2024-06-15", "2024-01-01", "2023-12-31"]);
    }

    #[test]
    fn test_unpadded_dates_sort_chronologically() {
        let (_dir, repo) = fixture(&[
            ("may.md", post("May", "2024-05-30", true, "")),
            ("june.md", post("June", "2024-6-1", true, "")),
        ]);
        let ids: Vec<_> = repo
            .list_published()
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["june", "may"]);
    }

    #[test]
    fn test_ties_and_undated_keep_directory_order() {
        let (_dir, repo) = fixture(&[
            ("b-undated.md", "---\ntitle: U\npublished: true\n---\n".to_string()),
            ("c-same.md", post("C", "2024-01-01", true, "")),
            ("a-same.md", post("A", "2024-01-01", true, "")),
            ("d-newer.md", post("D", "2024-02-01", true, "")),
        ]);
        let ids: Vec<_> = repo
            .list_published()
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["d-newer", "a-same", "c-same", "b-undated"]);
    }

    #[test]
    fn test_unpublished_excluded_from_listing_but_retrievable() {
        let (_dir, repo) = fixture(&[
            ("live.md", post("Live", "2024-01-01", true, "live")),
            ("draft.md", post("Draft", "2024-02-01", false, "draft")),
            ("no-flag.md", "---\ntitle: No flag\n---\nbody".to_string()),
        ]);

        let listed: Vec<_> = repo
            .list_published()
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(listed, vec!["live"]);

        let draft = repo.get_document("draft").unwrap();
        assert!(!draft.front_matter.published);
        assert!(draft.html.contains("draft"));
    }

    #[test]
    fn test_list_identifiers_includes_everything_resolvable() {
        let (dir, repo) = fixture(&[
            ("my-post.md", post("Mine", "2024-01-01", true, "x")),
            ("draft.markdown", post("Draft", "2024-01-02", false, "y")),
            ("notes.txt", "not a post".to_string()),
        ]);
        fs::create_dir(dir.path().join("images.md")).unwrap();

        let ids = repo.list_identifiers().unwrap();
        assert_eq!(ids, vec!["draft", "my-post"]);
        for id in &ids {
            assert_eq!(&repo.get_document(id).unwrap().id, id);
        }

        let listed = repo.list_published().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "my-post");
    }

    #[cfg(unix)]
    #[test]
    fn test_unresolvable_stems_are_not_listed() {
        let (_dir, repo) = fixture(&[
            ("a\\b.md", post("Backslash", "2024-01-01", true, "x")),
            ("plain.md", post("Plain", "2024-01-01", true, "y")),
        ]);

        let ids = repo.list_identifiers().unwrap();
        assert_eq!(ids, vec!["plain"]);
        for id in &ids {
            assert!(repo.get_document(id).is_ok());
        }

        let listed: Vec<_> = repo
            .list_published()
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(listed, vec!["plain"]);
    }

    #[test]
    fn test_missing_document() {
        let (_dir, repo) = fixture(&[("a.md", post("A", "2024-01-01", true, "a"))]);
        let err = repo.get_document("missing-post").unwrap_err();
        assert!(matches!(err, ContentError::DocumentNotFound { ref id, .. } if id == "missing-post"));
    }

    #[test]
    fn test_traversal_identifiers_are_not_found() {
        let (_dir, repo) = fixture(&[("a.md", post("A", "2024-01-01", true, "a"))]);
        for id in ["", ".", "..", "../a", "sub/a", ".hidden"] {
            assert!(
                matches!(repo.get_document(id), Err(ContentError::DocumentNotFound { .. })),
                "{:?} should not resolve",
                id
            );
        }
    }

    #[test]
    fn test_missing_directory_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let repo = ContentRepository::new(
            dir.path().join("nope"),
            &["md".to_string()],
            Arc::new(MarkdownRenderer::new()),
        );
        assert!(matches!(
            repo.list_published(),
            Err(ContentError::DirectoryUnavailable { .. })
        ));
        assert!(matches!(
            repo.list_identifiers(),
            Err(ContentError::DirectoryUnavailable { .. })
        ));
    }

    #[test]
    fn test_duplicate_identifier_is_error() {
        let (_dir, repo) = fixture(&[
            ("post.md", post("One", "2024-01-01", true, "")),
            ("post.markdown", post("Two", "2024-01-01", true, "")),
        ]);
        assert!(matches!(
            repo.list_identifiers(),
            Err(ContentError::DuplicateIdentifier { ref id, .. }) if id == "post"
        ));
        assert!(matches!(
            repo.get_document("post"),
            Err(ContentError::DuplicateIdentifier { .. })
        ));
    }

    #[test]
    fn test_malformed_frontmatter() {
        let (_dir, repo) = fixture(&[(
            "broken.md",
            "---\ntitle: [oops\npublished: true\n---\nbody".to_string(),
        )]);
        assert!(matches!(
            repo.get_document("broken"),
            Err(ContentError::FrontMatterParse { .. })
        ));
        assert!(matches!(
            repo.list_published(),
            Err(ContentError::FrontMatterParse { .. })
        ));
    }

    #[test]
    fn test_get_document_renders_and_is_idempotent() {
        let (_dir, repo) = fixture(&[(
            "hi.md",
            post("Hi", "2024-01-01", true, "# Hi\n\nHello **world**."),
        )]);

        let first = repo.get_document("hi").unwrap();
        assert!(first.html.contains("<h1>Hi</h1>"));
        assert!(first.html.contains("<strong>world</strong>"));
        assert_eq!(first.body, "# Hi\n\nHello **world**.");
        assert_eq!(first.excerpt.as_deref(), Some("Hello world."));

        let second = repo.get_document("hi").unwrap();
        assert_eq!(first.html, second.html);
    }

    #[test]
    fn test_excerpt_skipped_when_description_given() {
        let (_dir, repo) = fixture(&[(
            "d.md",
            "---\ntitle: D\ndescription: Given\n---\nFirst paragraph.".to_string(),
        )]);
        let doc = repo.get_document("d").unwrap();
        assert_eq!(doc.excerpt, None);
        assert_eq!(doc.summary(), Some("Given"));
    }

    #[tokio::test]
    async fn test_get_document_async_matches_sync() {
        let (_dir, repo) = fixture(&[("a.md", post("A", "2024-01-01", true, "*a*"))]);
        let repo = repo.with_render_timeout(Some(Duration::from_secs(30)));
        let async_doc = repo.get_document_async("a").await.unwrap();
        let sync_doc = repo.get_document("a").unwrap();
        assert_eq!(async_doc.html, sync_doc.html);
        assert!(async_doc.html.contains("<em>a</em>"));
    }

    #[tokio::test]
    async fn test_render_timeout_is_markdown_render_error() {
        let never = std::future::pending::<Result<Document, JoinError>>();
        let err = bounded_render("slow", Some(Duration::from_millis(1)), never)
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::MarkdownRender { ref id, .. } if id == "slow"));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_sort_newest_first_is_stable() {
        let summary = |id: &str, date: Option<&str>| DocumentSummary {
            id: id.to_string(),
            front_matter: FrontMatter {
                date: date.map(str::to_string),
                ..Default::default()
            },
        };
        let sorted = sort_newest_first(vec![
            summary("undated", None),
            summary("tie-b", Some("2024-01-01")),
            summary("tie-a", Some("2024-01-01 00:00")),
            summary("newest", Some("2024-03-01")),
        ]);
        let ids: Vec<_> = sorted.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "tie-b", "tie-a", "undated"]);
    }

    #[tokio::test]
    async fn test_load_all_isolates_failures() {
        let (_dir, repo) = fixture(&[
            ("good.md", post("Good", "2024-01-01", true, "ok")),
            ("bad.md", "---\ntitle: [bad\n---\n".to_string()),
            ("also-good.md", post("Also", "2024-01-02", false, "ok")),
        ]);

        let results = repo.load_all().await.unwrap();
        let ids: Vec<_> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["also-good", "bad", "good"]);
        assert!(results[0].1.is_ok());
        assert!(matches!(
            results[1].1,
            Err(ContentError::FrontMatterParse { .. })
        ));
        assert!(results[2].1.is_ok());
    }
}
