//! postpress: render a directory of markdown posts
//!
//! Posts are either published ahead of time into a static output tree or
//! rendered on every request by a small HTTP server. Both front-ends share
//! the same repository and renderer.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod render;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// A site rooted at a directory
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Markdown posts
    pub posts_dir: PathBuf,
    /// index.html / post.html templates
    pub templates_dir: PathBuf,
    /// Static assets copied or served as-is
    pub public_dir: PathBuf,
    /// Static build output
    pub out_dir: PathBuf,
}

impl Site {
    /// Create a site from a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(config::CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a site with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let posts_dir = base_dir.join(&config.posts_dir);
        let templates_dir = base_dir.join(&config.templates_dir);
        let public_dir = base_dir.join(&config.public_dir);
        let out_dir = base_dir.join(&config.out_dir);

        Self {
            config,
            base_dir,
            posts_dir,
            templates_dir,
            public_dir,
            out_dir,
        }
    }

    /// Redirect the static build output
    pub fn set_out_dir<P: AsRef<Path>>(&mut self, out_dir: P) {
        self.out_dir = self.base_dir.join(out_dir);
    }

    /// Path of the configuration file
    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(config::CONFIG_FILE)
    }

    /// Repository over this site's posts
    pub fn repository(&self) -> content::PostRepository {
        content::PostRepository::for_site(self)
    }

    /// Markdown renderer configured for this site
    pub fn markdown_renderer(&self) -> content::MarkdownRenderer {
        content::MarkdownRenderer::with_config(&self.config.markdown)
    }

    /// Publish the static site
    pub async fn build(&self) -> Result<generator::PublishReport> {
        commands::build::run(self).await
    }

    /// Remove the output directory
    pub async fn clean(&self) -> Result<()> {
        commands::clean::run(self).await
    }
}
