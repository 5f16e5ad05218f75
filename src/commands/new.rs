//! Create a new post

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::content::FrontMatter;
use crate::Site;

/// Create `posts/<slug>.<ext>` with a front-matter scaffold
///
/// The slug defaults to the slugified title. Existing files are never
/// overwritten.
pub fn create_post(site: &Site, title: &str, slug: Option<&str>) -> Result<PathBuf> {
    let slug = match slug {
        Some(s) => slug::slugify(s),
        None => slug::slugify(title),
    };
    if slug.is_empty() {
        bail!("Cannot derive a file name from title {:?}", title);
    }

    let ext = site
        .config
        .markdown
        .extensions
        .first()
        .map(String::as_str)
        .unwrap_or("md");
    let file_path = site.posts_dir.join(format!("{}.{}", slug, ext));

    if file_path.exists() {
        bail!("File already exists: {:?}", file_path);
    }

    let front_matter = FrontMatter {
        title: Some(title.to_string()),
        date: Some(chrono::Local::now().format("%Y-%m-%d").to_string()),
        description: Some(String::new()),
        ..Default::default()
    };
    let content = format!("---\n{}---\n\n", serde_yaml::to_string(&front_matter)?);

    fs::create_dir_all(&site.posts_dir)
        .with_context(|| format!("Failed to create {:?}", site.posts_dir))?;
    fs::write(&file_path, content).with_context(|| format!("Failed to write {:?}", file_path))?;

    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}
