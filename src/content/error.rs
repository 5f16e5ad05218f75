//! Errors raised while reading posts from disk

use std::path::PathBuf;
use thiserror::Error;

/// Post repository errors
#[derive(Error, Debug)]
pub enum ContentError {
    /// No post file backs the requested id
    #[error("Post not found: {id}")]
    NotFound { id: String },

    #[error("Invalid front-matter in {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Post loading task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ContentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is the recoverable "unknown id" case
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
