//! Initialize a new site

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::config::{SiteConfig, CONFIG_FILE};
use crate::templates::BUILTIN_TEMPLATES;

const STYLE_CSS: &str = r#"body {
  max-width: 42rem;
  margin: 2rem auto;
  padding: 0 1rem;
  font-family: system-ui, sans-serif;
  line-height: 1.6;
}

pre {
  padding: 1rem;
  overflow-x: auto;
  background: #2b303b;
  color: #c0c5ce;
}
"#;

const HELLO_BODY: &str = r#"Welcome to your new blog! This post lives in `posts/hello-world.md`.

## Writing

Create a post with:

```bash
$ postpress new "My New Post"
```

## Previewing

```bash
$ postpress server
```

## Publishing

```bash
$ postpress build
```
"#;

/// Initialize a new site in the given directory
///
/// Refuses to touch a directory that already holds a site configuration.
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        bail!("{:?} already exists, refusing to initialize", config_path);
    }

    let config = SiteConfig::default();
    let posts_dir = target_dir.join(&config.posts_dir);
    let templates_dir = target_dir.join(&config.templates_dir);
    let public_dir = target_dir.join(&config.public_dir);

    for dir in [&posts_dir, &templates_dir, &public_dir] {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }

    let config_content = format!("# Site configuration\n{}", serde_yaml::to_string(&config)?);
    write_new(&config_path, &config_content)?;

    for (name, source) in BUILTIN_TEMPLATES {
        write_new(&templates_dir.join(name), source)?;
    }
    write_new(&public_dir.join("style.css"), STYLE_CSS)?;

    let hello = format!(
        "---\ntitle: Hello World\ndate: {}\ndescription: Your very first post\n---\n\n{}",
        chrono::Local::now().format("%Y-%m-%d"),
        HELLO_BODY
    );
    write_new(&posts_dir.join("hello-world.md"), &hello)?;

    Ok(())
}

/// Write a scaffold file, leaving existing files alone
fn write_new(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        tracing::warn!("Keeping existing {:?}", path);
        return Ok(());
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))?;
    tracing::debug!("Created: {:?}", path);
    Ok(())
}
