//! Publish the static site

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::content::MarkdownRenderer;
use crate::generator::{Generator, PublishReport};
use crate::Site;

/// Publish the site once
pub async fn run(site: &Site) -> Result<PublishReport> {
    let markdown = Arc::new(site.markdown_renderer());
    publish(site, markdown).await
}

async fn publish(site: &Site, markdown: Arc<MarkdownRenderer>) -> Result<PublishReport> {
    tracing::info!("Building static site into {:?}", site.out_dir);

    let report = Generator::new(site, markdown).publish().await?;

    tracing::info!(
        "Generated {} posts and copied {} assets in {:.2}s",
        report.posts,
        report.assets,
        report.duration.as_secs_f64()
    );

    Ok(report)
}

/// Watch the site's inputs and republish on every change
///
/// Each change triggers a full publish; failures are logged and watching
/// continues.
pub async fn watch(site: &Site) -> Result<()> {
    let markdown = Arc::new(site.markdown_renderer());
    let (tx, mut rx) = mpsc::unbounded_channel::<DebounceEventResult>();

    // Collapse bursts of editor writes into a single rebuild
    let mut debouncer = new_debouncer(
        Duration::from_millis(500),
        move |events: DebounceEventResult| {
            let _ = tx.send(events);
        },
    )?;

    for dir in [&site.posts_dir, &site.templates_dir, &site.public_dir] {
        if dir.exists() {
            debouncer.watcher().watch(dir, RecursiveMode::Recursive)?;
            tracing::debug!("Watching: {:?}", dir);
        }
    }

    let config_path = site.config_path();
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    while let Some(result) = rx.recv().await {
        match result {
            Ok(events) => {
                let changed: Vec<_> = events
                    .iter()
                    .filter(|e| is_relevant(&e.path, &site.out_dir))
                    .collect();

                if changed.is_empty() {
                    continue;
                }

                for event in &changed {
                    tracing::info!("File changed: {}", event.path.display());
                }

                if let Err(e) = publish(site, markdown.clone()).await {
                    tracing::error!("Build failed: {:#}", e);
                }
            }
            Err(e) => {
                tracing::error!("Watch error: {:?}", e);
            }
        }
    }

    Ok(())
}

/// Skip our own output and editor noise
fn is_relevant(path: &Path, out_dir: &Path) -> bool {
    if path.starts_with(out_dir) {
        return false;
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    !(name.ends_with('~')
        || name.ends_with(".swp")
        || name.ends_with(".tmp")
        || name == ".DS_Store")
}
