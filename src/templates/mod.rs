//! Page templates using the Tera template engine
//!
//! `index.html` and `post.html` are read from the site's templates
//! directory. A template missing there falls back to the default embedded in
//! the binary.

use anyhow::{Context as _, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::helpers;

/// Template listing all posts
pub const INDEX_TEMPLATE: &str = "index.html";
/// Template for a single post
pub const POST_TEMPLATE: &str = "post.html";

/// Built-in templates, also written out by `init`
pub const BUILTIN_TEMPLATES: [(&str, &str); 2] = [
    (INDEX_TEMPLATE, include_str!("default/index.html")),
    (POST_TEMPLATE, include_str!("default/post.html")),
];

/// Template renderer for the index and post pages
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a renderer with only the built-in templates
    pub fn builtin(config: &SiteConfig) -> Result<Self> {
        Self::from_sources(BUILTIN_TEMPLATES.to_vec(), config)
    }

    /// Load templates from a directory, falling back to the built-ins
    pub async fn load(templates_dir: &Path, config: &SiteConfig) -> Result<Self> {
        let mut sources = Vec::with_capacity(BUILTIN_TEMPLATES.len());

        for (name, builtin) in BUILTIN_TEMPLATES {
            let path = templates_dir.join(name);
            let source = match tokio::fs::read_to_string(&path).await {
                Ok(source) => source,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!("No {:?}, using built-in {}", path, name);
                    builtin.to_string()
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to read template {:?}", path))
                }
            };
            sources.push((name, source));
        }

        Self::from_sources(sources, config)
    }

    /// Build a renderer from (name, source) pairs
    pub fn from_sources<S: AsRef<str>>(
        sources: Vec<(&str, S)>,
        config: &SiteConfig,
    ) -> Result<Self> {
        // Autoescaping stays on for .html templates; post bodies use `| safe`
        let mut tera = Tera::default();

        for (name, source) in &sources {
            tera.add_raw_template(name, source.as_ref())
                .with_context(|| format!("Invalid template {}", name))?;
        }

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);
        tera.register_function(
            "url_for",
            UrlFor {
                config: config.clone(),
            },
        );

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        self.tera
            .render(template_name, context)
            .with_context(|| format!("Failed to render {}", template_name))
    }
}

/// Tera function: `url_for(path="public/style.css")` prefixed with the site root
struct UrlFor {
    config: SiteConfig,
}

impl tera::Function for UrlFor {
    fn call(&self, args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        let path = match args.get("path") {
            Some(val) => tera::try_get_value!("url_for", "path", String, val),
            None => String::new(),
        };
        Ok(tera::Value::String(helpers::url_for(&self.config, &path)))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!(
            "{}{}",
            truncated.trim_end(),
            omission
        )))
    }
}

/// Tera filter: format a front-matter date string
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "YYYY-MM-DD".to_string(),
    };

    Ok(tera::Value::String(helpers::format_date(&s, &format)))
}

/// Strip HTML tags from content
fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

// Template context data

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub url: String,
    pub root: String,
}

impl From<&SiteConfig> for SiteData {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            url: config.url.clone(),
            root: helpers::url_for(config, ""),
        }
    }
}

/// A post as listed on the index page, without its body
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub date: String,
    pub description: String,
    pub url: String,
}

/// A post with its body rendered to HTML
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub id: String,
    pub title: String,
    pub date: String,
    pub description: String,
    pub url: String,
    /// Rendered HTML body
    pub content: String,
    pub extra: HashMap<String, serde_yaml::Value>,
}
