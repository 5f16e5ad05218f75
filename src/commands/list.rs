//! List site posts

use anyhow::Result;

use crate::content::Post;
use crate::Site;

/// Print every post in listing order
pub async fn run(site: &Site) -> Result<()> {
    let posts = site.repository().list_posts().await?;
    print!("{}", format_listing(&posts));
    Ok(())
}

/// One line per post: date, id and title
fn format_listing(posts: &[Post]) -> String {
    let mut out = format!("Posts ({}):\n", posts.len());
    for post in posts {
        let date = if post.date.is_empty() {
            "----------"
        } else {
            post.date.as_str()
        };
        out.push_str(&format!("  {} - {} [{}]\n", date, post.title, post.id));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_listing() {
        let posts = vec![
            Post::parse("b", "b.md", "---\ntitle: Bee\ndate: 2024-02-02\n---\n").unwrap(),
            Post::parse("a", "a.md", "no metadata").unwrap(),
        ];
        assert_eq!(
            format_listing(&posts),
            "Posts (2):\n  2024-02-02 - Bee [b]\n  ---------- - Untitled [a]\n"
        );
    }
}
