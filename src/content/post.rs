//! Post model

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::PathBuf;

use super::FrontMatter;
use crate::helpers;

/// Title used when front-matter has none
pub const DEFAULT_TITLE: &str = "Untitled";

/// A blog post as read from disk
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// Slug taken from the file name, unique within a listing
    pub id: String,

    pub title: String,

    /// Date as written in front-matter, empty when absent
    pub date: String,

    pub description: String,

    /// Markdown body after the front-matter block
    pub raw_content: String,

    /// Backing file
    #[serde(skip)]
    pub source: PathBuf,

    /// Custom front-matter fields
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Post {
    /// Build a post from the full text of its source file
    pub fn parse(id: impl Into<String>, source: impl Into<PathBuf>, text: &str) -> Result<Self> {
        let (fm, body) = FrontMatter::parse(text)?;

        Ok(Self {
            id: id.into(),
            title: fm.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            date: fm.date.unwrap_or_default(),
            description: fm.description.unwrap_or_default(),
            raw_content: body.to_string(),
            source: source.into(),
            extra: fm.extra,
        })
    }

    /// Parsed date used for ordering, the epoch when missing or invalid
    pub fn sort_date(&self) -> NaiveDateTime {
        helpers::sort_key(&self.date)
    }
}

/// Sort posts newest first; ties fall back to id so listings are stable
pub fn sort_posts(posts: &mut [Post]) {
    posts.sort_by_cached_key(|p| (Reverse(p.sort_date()), p.id.clone()));
}
