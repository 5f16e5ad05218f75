//! Clean the output directory

use anyhow::{Context, Result};

use crate::Site;

/// Remove the output directory if it exists
pub async fn run(site: &Site) -> Result<()> {
    if tokio::fs::try_exists(&site.out_dir).await.unwrap_or(false) {
        tokio::fs::remove_dir_all(&site.out_dir)
            .await
            .with_context(|| format!("Failed to remove {:?}", site.out_dir))?;
        tracing::info!("Deleted: {:?}", site.out_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_clean_removes_output() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        std::fs::create_dir_all(site.out_dir.join("post/a")).unwrap();
        std::fs::write(site.out_dir.join("index.html"), "x").unwrap();

        run(&site).await.unwrap();
        assert!(!site.out_dir.exists());

        // Cleaning twice is fine
        run(&site).await.unwrap();
    }
}
