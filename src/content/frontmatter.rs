//! Front-matter parsing

use anyhow::{anyhow, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Custom deserializer that accepts any YAML/JSON scalar as a string.
///
/// `date: 2024` or `title: 42` are valid front-matter and must not fail the
/// whole post just because the value is not quoted.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct Scalar;

    impl<'de> Visitor<'de> for Scalar {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number or boolean")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(Scalar)
        }
    }

    deserializer.deserialize_any(Scalar)
}

/// Front-matter data from a post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "scalar_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub date: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub description: Option<String>,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    ///
    /// Content without a front-matter block yields the default metadata and
    /// the input, untouched apart from a byte order mark, as body. A block
    /// that is present but malformed is an error.
    pub fn parse(content: &str) -> Result<(Self, &str)> {
        let content = content.trim_start_matches('\u{feff}');
        let trimmed = content.trim_start();

        let parsed = if trimmed.starts_with("---") {
            // YAML front-matter (---)
            Self::parse_yaml(trimmed)?
        } else if trimmed.starts_with(";;;") {
            // JSON front-matter fenced by ;;;
            Self::parse_json_fenced(trimmed)?
        } else if trimmed.starts_with('{') {
            // JSON front-matter ({ ... })
            Self::parse_json(trimmed)
        } else {
            None
        };

        Ok(parsed.unwrap_or_else(|| (FrontMatter::default(), content)))
    }

    fn parse_yaml(content: &str) -> Result<Option<(Self, &str)>> {
        // No closing ---, treat as no front-matter
        let Some((yaml_content, remaining)) = split_block(content, "---", &["---", "..."]) else {
            return Ok(None);
        };

        if yaml_content.trim().is_empty() {
            return Ok(Some((FrontMatter::default(), remaining)));
        }

        // A leading thematic break followed by prose is body text, not metadata
        if !has_yaml_structure(yaml_content) {
            return Ok(None);
        }

        let fm = serde_yaml::from_str::<FrontMatter>(yaml_content)
            .map_err(|e| anyhow!("Failed to parse YAML front-matter: {}", e))?;

        Ok(Some((fm, remaining)))
    }

    fn parse_json_fenced(content: &str) -> Result<Option<(Self, &str)>> {
        let Some((json_content, remaining)) = split_block(content, ";;;", &[";;;"]) else {
            return Ok(None);
        };

        let json_content = json_content.trim();
        if json_content.is_empty() {
            return Ok(Some((FrontMatter::default(), remaining)));
        }

        // The braces are optional inside ;;; fences
        let fm = if json_content.starts_with('{') {
            serde_json::from_str::<FrontMatter>(json_content)
        } else {
            serde_json::from_str::<FrontMatter>(&format!("{{{}}}", json_content))
        }
        .map_err(|e| anyhow!("Failed to parse JSON front-matter: {}", e))?;

        Ok(Some((fm, remaining)))
    }

    /// A bare leading object only counts as front-matter when it parses and
    /// ends its line; anything else is body text that happens to start with `{`
    fn parse_json(content: &str) -> Option<(Self, &str)> {
        let mut stream = serde_json::Deserializer::from_str(content).into_iter::<FrontMatter>();
        let fm = stream.next()?.ok()?;

        let rest = &content[stream.byte_offset()..];
        let rest = rest.trim_start_matches(&[' ', '\t'][..]);
        if !(rest.is_empty() || rest.starts_with('\n') || rest.starts_with("\r\n")) {
            return None;
        }

        Some((fm, trim_leading_newlines(rest)))
    }
}

/// Split `content` into the block between an opening delimiter line and the
/// first closing one, and the body after it
fn split_block<'a>(content: &'a str, open: &str, closes: &[&str]) -> Option<(&'a str, &'a str)> {
    let mut lines = content.split_inclusive('\n');

    // The opening delimiter must be alone on its line
    let opening = lines.next()?;
    if opening.trim_end() != open {
        return None;
    }

    let start = opening.len();
    let mut offset = start;
    for line in lines {
        if closes.contains(&line.trim_end()) {
            let body = trim_leading_newlines(&content[offset + line.len()..]);
            return Some((&content[start..offset], body));
        }
        offset += line.len();
    }

    None
}

fn trim_leading_newlines(s: &str) -> &str {
    s.trim_start_matches(&['\n', '\r'][..])
}

/// Whether a delimited block has at least one `key: value` line
fn has_yaml_structure(block: &str) -> bool {
    block.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }

        let Some(colon_pos) = trimmed.find(':') else {
            return false;
        };

        // Key should be a simple identifier and not a URL scheme
        let key = &trimmed[..colon_pos];
        let is_valid_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(key, "http" | "https" | "ftp");

        let after_colon = &trimmed[colon_pos + 1..];
        is_valid_key && (after_colon.is_empty() || after_colon.starts_with(' '))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Hello World
date: 2024-01-15
description: First post
layout: wide
---

This is the content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Hello World"));
        assert_eq!(fm.date.as_deref(), Some("2024-01-15"));
        assert_eq!(fm.description.as_deref(), Some("First post"));
        assert_eq!(
            fm.extra.get("layout").and_then(|v| v.as_str()),
            Some("wide")
        );
        assert_eq!(remaining, "This is the content.\n");
    }

    #[test]
    fn test_parse_json_frontmatter() {
        let content = r#"{"title": "Test Post", "date": "2024-02-01"}

This is content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Test Post"));
        assert_eq!(fm.date.as_deref(), Some("2024-02-01"));
        assert_eq!(remaining, "This is content.\n");
    }

    #[test]
    fn test_parse_fenced_json_frontmatter() {
        let content = ";;;\n\"title\": \"Fenced\",\n\"tags\": [\"a\"]\n;;;\nBody\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Fenced"));
        assert!(fm.extra.contains_key("tags"));
        assert_eq!(remaining, "Body\n");

        let braced = ";;;\n{\"date\": \"2024-05-05\"}\n;;;\n";
        let (fm, remaining) = FrontMatter::parse(braced).unwrap();
        assert_eq!(fm.date.as_deref(), Some("2024-05-05"));
        assert_eq!(remaining, "");

        assert!(FrontMatter::parse(";;;\n\"title\": \n;;;\nBody").is_err());
    }

    #[test]
    fn test_unquoted_scalars_become_strings() {
        let content = "---\ntitle: 1984\ndate: 2024\ndescription:\n---\nBody";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("1984"));
        assert_eq!(fm.date.as_deref(), Some("2024"));
        assert_eq!(fm.description, None);
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_no_frontmatter() {
        let (fm, remaining) = FrontMatter::parse("# Just a heading\n").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, "# Just a heading\n");
    }

    #[test]
    fn test_empty_frontmatter() {
        let (fm, remaining) = FrontMatter::parse("---\n---\nBody text").unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, "Body text");
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let content = "---\ntitle: [unclosed\ndate: 2024-01-01\n---\nBody";
        assert!(FrontMatter::parse(content).is_err());
    }

    #[test]
    fn test_brace_body_is_not_frontmatter() {
        for content in [
            "{{ braces }} are just text here\n",
            "{\"title\": }\nBody",
            "{\"title\": \"x\"} trailing words\n",
        ] {
            let (fm, remaining) = FrontMatter::parse(content).unwrap();
            assert!(fm.title.is_none(), "{:?}", content);
            assert_eq!(remaining, content);
        }
    }

    #[test]
    fn test_body_keeps_leading_indentation() {
        let content = "    let x = 1;\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, content);

        let thematic = "\n---\n\nJust prose\n---\n";
        assert_eq!(FrontMatter::parse(thematic).unwrap().1, thematic);
    }

    #[test]
    fn test_markdown_separator_not_yaml() {
        let content = r#"---

Some random text with markdown lists:
- Item 1
- Item 2

---
More content here.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title, None);
        assert_eq!(remaining, content);
        assert!(remaining.contains("Some random text"));
    }

    #[test]
    fn test_content_with_url_not_yaml() {
        let content = "---\nCheck out https://example.com/path\n---\nMore content.\n";

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title, None);
        assert!(remaining.contains("https://example.com"));
    }

    #[test]
    fn test_unclosed_block_is_body() {
        let content = "---\ntitle: Never closed\n\nBody";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert!(fm.title.is_none());
        assert_eq!(remaining, content);
    }
}
