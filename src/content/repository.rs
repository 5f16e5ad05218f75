//! Post repository - lists and loads posts from the posts directory

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;

use super::{sort_posts, ContentError, Post};
use crate::Site;

/// Reads posts from a flat directory of markdown files
///
/// Every call goes back to disk; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct PostRepository {
    posts_dir: PathBuf,
    extensions: Vec<String>,
    draft_prefix: String,
}

impl PostRepository {
    /// Create a repository over `posts_dir`
    ///
    /// `extensions` are matched without the leading dot, in priority order.
    /// Files whose name starts with `draft_prefix` are ignored.
    pub fn new(
        posts_dir: impl Into<PathBuf>,
        extensions: Vec<String>,
        draft_prefix: impl Into<String>,
    ) -> Self {
        Self {
            posts_dir: posts_dir.into(),
            extensions,
            draft_prefix: draft_prefix.into(),
        }
    }

    /// Repository configured from a site
    pub fn for_site(site: &Site) -> Self {
        Self::new(
            &site.posts_dir,
            site.config.markdown.extensions.clone(),
            &site.config.draft_prefix,
        )
    }

    pub fn posts_dir(&self) -> &Path {
        &self.posts_dir
    }

    /// List every eligible post, newest first
    pub async fn list_posts(&self) -> Result<Vec<Post>, ContentError> {
        let mut entries = tokio::fs::read_dir(&self.posts_dir)
            .await
            .map_err(|e| ContentError::io(&self.posts_dir, e))?;

        // id -> (extension rank, path); lower rank wins on duplicate ids
        let mut files: BTreeMap<String, (usize, PathBuf)> = BTreeMap::new();

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ContentError::io(&self.posts_dir, e))?
        {
            let path = entry.path();
            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!("Skipping non UTF-8 file name {:?}", path);
                continue;
            };
            let Some((id, rank)) = self.eligible(&file_name) else {
                continue;
            };

            // Follows symlinks, unlike DirEntry::file_type
            let metadata = tokio::fs::metadata(&path)
                .await
                .map_err(|e| ContentError::io(&path, e))?;
            if !metadata.is_file() {
                continue;
            }

            let keep = match files.get(&id) {
                Some((existing, kept)) if *existing <= rank => {
                    tracing::warn!("Ignoring {:?}: id {:?} already used by {:?}", path, id, kept);
                    false
                }
                Some((_, replaced)) => {
                    tracing::warn!("Ignoring {:?}: id {:?} already used by {:?}", replaced, id, path);
                    true
                }
                None => true,
            };
            if keep {
                files.insert(id, (rank, path));
            }
        }

        let mut tasks = JoinSet::new();
        for (id, (_, path)) in files {
            tasks.spawn(read_post(id, path));
        }

        let mut posts = Vec::with_capacity(tasks.len());
        while let Some(result) = tasks.join_next().await {
            posts.push(result??);
        }

        sort_posts(&mut posts);
        tracing::debug!("Listed {} posts from {:?}", posts.len(), self.posts_dir);

        Ok(posts)
    }

    /// Load a single post by id
    pub async fn get_post(&self, id: &str) -> Result<Post, ContentError> {
        if !self.is_valid_id(id) {
            return Err(ContentError::NotFound { id: id.to_string() });
        }

        for ext in &self.extensions {
            let path = self.posts_dir.join(format!("{}.{}", id, ext));
            match tokio::fs::metadata(&path).await {
                Ok(metadata) if metadata.is_file() => return read_post(id.to_string(), path).await,
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(ContentError::io(&path, e)),
            }
        }

        Err(ContentError::NotFound { id: id.to_string() })
    }

    /// Id and extension rank for a listable file name
    fn eligible(&self, file_name: &str) -> Option<(String, usize)> {
        if self.is_draft(file_name) {
            return None;
        }

        let (id, rank) = self.extensions.iter().enumerate().find_map(|(rank, ext)| {
            let stem = file_name.strip_suffix(ext.as_str())?.strip_suffix('.')?;
            (!stem.is_empty()).then(|| (stem.to_string(), rank))
        })?;

        // Listed ids become output paths, so they obey the same rules as lookups
        if !self.is_valid_id(&id) {
            tracing::warn!("Skipping {:?}: {:?} is not a usable post id", file_name, id);
            return None;
        }

        Some((id, rank))
    }

    fn is_draft(&self, name: &str) -> bool {
        !self.draft_prefix.is_empty() && name.starts_with(&self.draft_prefix)
    }

    /// Ids map straight to file names, so anything that could escape the
    /// posts directory is rejected
    fn is_valid_id(&self, id: &str) -> bool {
        !id.is_empty()
            && id != "."
            && !id.contains(&['/', '\\', '\0'][..])
            && !id.contains("..")
            && !self.is_draft(id)
    }
}

/// Read and parse one post file
async fn read_post(id: String, path: PathBuf) -> Result<Post, ContentError> {
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ContentError::io(&path, e))?;

    Post::parse(id, &path, &text).map_err(|e| ContentError::Parse {
        path,
        message: e.to_string(),
    })
}
