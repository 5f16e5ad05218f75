//! Generator module - publishes the site as static HTML files

use anyhow::{bail, Context, Result};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

use crate::content::MarkdownRenderer;
use crate::render::Renderer;
use crate::Site;

/// Outcome of a successful publish
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// Number of post pages written
    pub posts: usize,
    /// Number of files copied from the public directory
    pub assets: usize,
    pub duration: Duration,
}

/// Static site generator
pub struct Generator {
    site: Site,
    markdown: Arc<MarkdownRenderer>,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &Site, markdown: Arc<MarkdownRenderer>) -> Self {
        Self {
            site: site.clone(),
            markdown,
        }
    }

    /// Publish the whole site into the output directory
    ///
    /// The output directory is recreated from scratch. Any failure aborts the
    /// publish and may leave partial output behind.
    pub async fn publish(&self) -> Result<PublishReport> {
        let start = Instant::now();
        let out_dir = &self.site.out_dir;

        self.check_out_dir()?;
        reset_dir(out_dir).await?;

        // Listing posts and copying assets are independent
        let repository = self.site.repository();
        let (posts, assets) = tokio::try_join!(
            async {
                repository
                    .list_posts()
                    .await
                    .with_context(|| format!("Failed to read posts from {:?}", repository.posts_dir()))
            },
            copy_public(self.site.public_dir.clone(), out_dir.join("public")),
        )?;
        tracing::info!("Found {} posts", posts.len());
        tracing::info!("Copied {} public assets", assets);

        let renderer = Renderer::load(&self.site, self.markdown.clone()).await?;

        let index_html = renderer.render_index(&posts)?;
        write_file(&out_dir.join("index.html"), index_html).await?;
        tracing::info!("Generated index.html");

        for post in &posts {
            let post_html = renderer
                .render_post(post)
                .with_context(|| format!("Failed to render post {:?}", post.id))?;
            let output_path = out_dir.join("post").join(&post.id).join("index.html");
            write_file(&output_path, post_html).await?;
            tracing::debug!("Generated /post/{}/index.html", post.id);
        }

        Ok(PublishReport {
            posts: posts.len(),
            assets,
            duration: start.elapsed(),
        })
    }

    /// Refuse output locations that would wipe the site's own inputs
    fn check_out_dir(&self) -> Result<()> {
        let out_dir = &lexical(&self.site.out_dir);
        let public_dir = &lexical(&self.site.public_dir);

        let inputs = [
            lexical(&self.site.base_dir),
            lexical(&self.site.posts_dir),
            lexical(&self.site.templates_dir),
            public_dir.clone(),
        ];
        if let Some(input) = inputs.iter().find(|input| input.starts_with(out_dir)) {
            bail!(
                "Output directory {:?} would overwrite site input {:?}",
                out_dir,
                input
            );
        }

        // Copying public/ into itself never terminates
        if out_dir.starts_with(public_dir) {
            bail!(
                "Output directory {:?} must not be inside the public directory {:?}",
                out_dir,
                public_dir
            );
        }

        Ok(())
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn lexical(path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    resolved.push(component);
                }
            }
            other => resolved.push(other),
        }
    }
    resolved
}

/// Remove a directory if present and create it empty
async fn reset_dir(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => tracing::debug!("Deleted: {:?}", dir),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("Failed to remove {:?}", dir)),
    }

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {:?}", dir))
}

async fn write_file(path: &Path, contents: String) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {:?}", path))
}

/// Mirror the public directory on the blocking pool
async fn copy_public(source: PathBuf, dest: PathBuf) -> Result<usize> {
    if !tokio::fs::try_exists(&source).await.unwrap_or(false) {
        tracing::warn!("Public directory {:?} not found, skipping assets", source);
        return Ok(0);
    }

    tokio::task::spawn_blocking(move || copy_dir(&source, &dest)).await?
}

/// Recursively copy `source` into `dest`, returning the number of files
fn copy_dir(source: &Path, dest: &Path) -> Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to walk {:?}", source))?;
        let path = entry.path();
        let relative = path.strip_prefix(source)?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create dir {:?}", target))?;
        } else {
            std::fs::copy(path, &target)
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, target))?;
            copied += 1;
        }
    }

    Ok(copied)
}
