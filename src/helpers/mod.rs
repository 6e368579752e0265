//! Helper functions for templates, feeds and the sitemap

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
