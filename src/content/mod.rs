//! Content module - reads posts and converts their markdown

mod error;
mod frontmatter;
mod markdown;
mod post;
mod repository;

pub use error::ContentError;
pub use frontmatter::FrontMatter;
pub use markdown::MarkdownRenderer;
pub use post::{sort_posts, Post, DEFAULT_TITLE};
pub use repository::PostRepository;
