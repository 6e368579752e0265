//! Document and listing models

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;

use super::FrontMatter;

/// A post loaded by identifier, with its body rendered
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Identifier: the file name without its extension
    pub id: String,

    #[serde(flatten)]
    pub front_matter: FrontMatter,

    /// Raw markdown after the front-matter block
    pub body: String,

    /// Plain-text preview, only when the front-matter has no description
    pub excerpt: Option<String>,

    /// Rendered HTML content
    pub html: String,

    #[serde(skip)]
    pub source: PathBuf,
}

impl Document {
    pub fn title(&self) -> &str {
        self.front_matter.title.as_deref().unwrap_or(&self.id)
    }

    /// Description, or the excerpt when there is none
    pub fn summary(&self) -> Option<&str> {
        self.front_matter
            .description
            .as_deref()
            .or(self.excerpt.as_deref())
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.front_matter.parse_date()
    }
}

/// Listing-weight projection of a document: identifier and metadata only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub id: String,

    #[serde(flatten)]
    pub front_matter: FrontMatter,
}

impl DocumentSummary {
    pub fn title(&self) -> &str {
        self.front_matter.title.as_deref().unwrap_or(&self.id)
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.front_matter.parse_date()
    }
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            front_matter: doc.front_matter.clone(),
        }
    }
}
