//! Content module - loads posts, parses front-matter and renders markdown

mod document;
mod error;
mod frontmatter;
mod markdown;
pub mod repository;

pub use document::{Document, DocumentSummary};
pub use error::ContentError;
pub use frontmatter::{parse_date_string, FrontMatter, FrontMatterError};
pub use markdown::MarkdownRenderer;
pub use repository::ContentRepository;
