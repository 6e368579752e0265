//! Errors surfaced by the content pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single content request. None of these are retried.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content directory {path:?} is unavailable: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document {id:?} not found at {path:?}")]
    DocumentNotFound { id: String, path: PathBuf },

    #[error("malformed front-matter in {path:?}: {message}")]
    FrontMatterParse { path: PathBuf, message: String },

    #[error("failed to render document {id:?}: {message}")]
    MarkdownRender { id: String, message: String },

    #[error("identifier {id:?} is claimed by both {first:?} and {second:?}")]
    DuplicateIdentifier {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    /// Identifier or path the error refers to, for log lines
    pub fn subject(&self) -> String {
        match self {
            Self::DirectoryUnavailable { path, .. }
            | Self::FrontMatterParse { path, .. }
            | Self::Io { path, .. } => path.display().to_string(),
            Self::DocumentNotFound { id, .. }
            | Self::MarkdownRender { id, .. }
            | Self::DuplicateIdentifier { id, .. } => id.clone(),
        }
    }
}
