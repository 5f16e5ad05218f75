//! Page renderer - binds posts into the index and post templates

use anyhow::Result;
use std::sync::Arc;
use tera::Context;

use crate::config::SiteConfig;
use crate::content::{MarkdownRenderer, Post};
use crate::helpers;
use crate::templates::{
    PostDetail, PostSummary, SiteData, TemplateRenderer, INDEX_TEMPLATE, POST_TEMPLATE,
};
use crate::Site;

/// Renders posts to complete HTML pages
pub struct Renderer {
    config: SiteConfig,
    templates: TemplateRenderer,
    markdown: Arc<MarkdownRenderer>,
}

impl Renderer {
    pub fn new(
        config: SiteConfig,
        templates: TemplateRenderer,
        markdown: Arc<MarkdownRenderer>,
    ) -> Self {
        Self {
            config,
            templates,
            markdown,
        }
    }

    /// Load the site's templates from disk and pair them with `markdown`
    pub async fn load(site: &Site, markdown: Arc<MarkdownRenderer>) -> Result<Self> {
        let templates = TemplateRenderer::load(&site.templates_dir, &site.config).await?;
        Ok(Self::new(site.config.clone(), templates, markdown))
    }

    /// Render the index page listing `posts` in the given order
    pub fn render_index(&self, posts: &[Post]) -> Result<String> {
        let summaries: Vec<PostSummary> = posts.iter().map(|p| self.summary(p)).collect();

        let mut context = self.base_context();
        context.insert("posts", &summaries);
        self.templates.render(INDEX_TEMPLATE, &context)
    }

    /// Render a single post page, converting its markdown body to HTML
    pub fn render_post(&self, post: &Post) -> Result<String> {
        let detail = PostDetail {
            id: post.id.clone(),
            title: post.title.clone(),
            date: post.date.clone(),
            description: post.description.clone(),
            url: helpers::post_url(&self.config, &post.id),
            content: self.markdown.render(&post.raw_content),
            extra: post.extra.clone(),
        };

        let mut context = self.base_context();
        context.insert("post", &detail);
        self.templates.render(POST_TEMPLATE, &context)
    }

    fn summary(&self, post: &Post) -> PostSummary {
        PostSummary {
            id: post.id.clone(),
            title: post.title.clone(),
            date: post.date.clone(),
            description: post.description.clone(),
            url: helpers::post_url(&self.config, &post.id),
        }
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteData::from(&self.config));
        context
    }
}
