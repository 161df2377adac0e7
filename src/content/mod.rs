//! Content module - documents, front matter, and Markdown rendering

mod document;
mod error;
mod frontmatter;
pub mod loader;
mod markdown;
pub mod permalink;

pub use document::{Document, DocumentKind};
pub use error::RenderError;
pub(crate) use error::describe_tera_error;
pub use frontmatter::{Format, FrontMatter};
pub use markdown::{toc_html, MarkdownRenderer, RenderedMarkdown, TocEntry};
