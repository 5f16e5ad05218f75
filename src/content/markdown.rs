//! Markdown rendering with syntax highlighting

use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::config::MarkdownConfig;

/// Markdown renderer with syntax highlighting
///
/// Loading syntax definitions is expensive, so one renderer is built at
/// startup and shared by reference.
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    highlight: bool,
    line_numbers: bool,
    options: Options,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer with default settings
    pub fn new() -> Self {
        Self::with_config(&MarkdownConfig::default())
    }

    /// Create with custom settings
    pub fn with_config(config: &MarkdownConfig) -> Self {
        // Front-matter is split off before rendering, so no metadata blocks
        let mut options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        if config.smart_punctuation {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }

        let theme_set = ThemeSet::load_defaults();
        if config.highlight && !theme_set.themes.contains_key(&config.theme) {
            tracing::warn!(
                "Unknown highlight theme {:?}, code blocks will be unstyled",
                config.theme
            );
        }

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set,
            theme_name: config.theme.clone(),
            highlight: config.highlight,
            line_numbers: config.line_numbers,
            options,
        }
    }

    /// Render markdown to HTML
    ///
    /// Never fails: syntax pulldown-cmark does not recognise is emitted as
    /// text.
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);

        let mut events: Vec<Event> = Vec::new();
        // (language, collected source) while inside a code block
        let mut code_block: Option<(Option<String>, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info
                            .split_whitespace()
                            .next()
                            .map(|lang| lang.to_string()),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, code)) = code_block.take() {
                        let html = self.render_code(&code, lang.as_deref());
                        events.push(Event::Html(CowStr::from(html)));
                    }
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some((_, code)) = code_block.as_mut() {
                        code.push_str(&text);
                    }
                }
                _ => events.push(event),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        html_output
    }

    /// Render a code block, highlighted when enabled
    fn render_code(&self, code: &str, lang: Option<&str>) -> String {
        let highlighted = if self.highlight {
            self.theme().and_then(|theme| self.highlight_lines(code, lang, theme))
        } else {
            None
        };

        let lines = highlighted.unwrap_or_else(|| {
            LinesWithEndings::from(code).map(html_escape).collect()
        });

        let class = lang
            .map(|l| format!(r#" class="language-{}""#, html_escape(l)))
            .unwrap_or_default();

        if self.line_numbers {
            self.add_line_numbers(&lines, &class)
        } else {
            format!("<pre><code{}>{}</code></pre>\n", class, lines.concat())
        }
    }

    fn theme(&self) -> Option<&Theme> {
        self.theme_set.themes.get(&self.theme_name)
    }

    /// Highlight line by line; None when syntect rejects the input
    fn highlight_lines(&self, code: &str, lang: Option<&str>, theme: &Theme) -> Option<Vec<String>> {
        let syntax = lang
            .and_then(|l| {
                self.syntax_set
                    .find_syntax_by_token(l)
                    .or_else(|| self.syntax_set.find_syntax_by_extension(l))
            })
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut lines = Vec::new();
        for line in LinesWithEndings::from(code) {
            let regions = match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(regions) => regions,
                Err(e) => {
                    tracing::debug!("Highlighting failed, falling back to plain code: {}", e);
                    return None;
                }
            };
            lines.push(styled_line_to_highlighted_html(&regions, IncludeBackground::No).ok()?);
        }

        Some(lines)
    }

    /// Lay out code lines next to a line number gutter
    fn add_line_numbers(&self, lines: &[String], class: &str) -> String {
        let gutter: Vec<String> = (1..=lines.len())
            .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
            .collect();
        let code: Vec<&str> = lines
            .iter()
            .map(|l| l.trim_end_matches(&['\n', '\r'][..]))
            .collect();

        format!(
            r#"<figure class="highlight"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code"><pre><code{}>{}</code></pre></td></tr></table></figure>"#,
            gutter.join("\n"),
            class,
            code.join("\n")
        )
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_renderer() -> MarkdownRenderer {
        MarkdownRenderer::with_config(&MarkdownConfig {
            highlight: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Hello World\n\nThis is a *test*.");
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<p>This is a <em>test</em>.</p>"));
    }

    #[test]
    fn test_code_block_and_link() {
        let renderer = MarkdownRenderer::new();
        let markdown = "```html\n<script>alert(1)</script>\n```\n\nSee [the docs](https://example.com/docs).\n";
        let html = renderer.render(markdown);
        assert!(html.contains(r#"<code class="language-html">"#));
        assert!(html.contains("&lt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"<a href="https://example.com/docs">the docs</a>"#));
    }

    #[test]
    fn test_unlabelled_code_block_stays_in_pre() {
        let html = plain_renderer().render("```\na < b && c\n```\n\n    indented <tag>\n");
        assert!(html.contains("<pre><code>a &lt; b &amp;&amp; c\n</code></pre>"));
        assert!(html.contains("<pre><code>indented &lt;tag&gt;\n</code></pre>"));
        assert!(!html.contains("<p>a"));
    }

    #[test]
    fn test_line_numbers() {
        let renderer = MarkdownRenderer::with_config(&MarkdownConfig {
            line_numbers: true,
            ..Default::default()
        });
        let html = renderer.render("```rust\nfn main() {}\nlet x = 1;\n```");
        assert!(html.contains(r#"<span class="line-number">1</span>"#));
        assert!(html.contains(r#"<span class="line-number">2</span>"#));
        assert!(!html.contains(r#"<span class="line-number">3</span>"#));
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = MarkdownRenderer::new();
        let markdown = "## Title\n\n- one\n- two\n\n```rust\nlet x = 1;\n```\n";
        assert_eq!(renderer.render(markdown), renderer.render(markdown));
    }

    #[test]
    fn test_malformed_markdown_degrades_to_text() {
        let html = plain_renderer().render("[unclosed link(\n\n**not bold\n\n![img](");
        assert!(html.contains("[unclosed link("));
        assert!(html.contains("**not bold"));
    }
}
