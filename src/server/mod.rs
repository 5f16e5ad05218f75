//! Request server - renders pages from disk on every request

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::{ContentError, MarkdownRenderer};
use crate::render::Renderer;
use crate::Site;

/// Server state, read-only and shared by all requests
struct ServerState {
    site: Site,
    markdown: Arc<MarkdownRenderer>,
}

/// Error returned by page handlers
///
/// Unknown posts become a plain 404; everything else is logged and answered
/// with a 500.
struct AppError(anyhow::Error);

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.0.downcast_ref::<ContentError>() {
            Some(ContentError::NotFound { id }) => {
                tracing::debug!("Post not found: {}", id);
                (StatusCode::NOT_FOUND, "Post not found").into_response()
            }
            _ => {
                tracing::error!("Request failed: {:#}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

/// Build the router serving `site`
pub fn router(site: &Site, markdown: Arc<MarkdownRenderer>) -> Router {
    let state = Arc::new(ServerState {
        site: site.clone(),
        markdown,
    });
    let assets = ServeDir::new(&site.public_dir);

    Router::new()
        .route("/", get(index_handler))
        .route("/post/:id", get(post_handler))
        .route("/post/:id/", get(post_handler))
        .nest_service("/public", assets.clone())
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server and run until the process is stopped
pub async fn start(site: &Site, ip: &str, port: u16) -> Result<()> {
    let markdown = Arc::new(site.markdown_renderer());
    let app = router(site, markdown);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// `GET /` - list posts fresh from disk and render the index
async fn index_handler(State(state): State<Arc<ServerState>>) -> Result<Html<String>, AppError> {
    let posts = state.site.repository().list_posts().await?;
    let renderer = Renderer::load(&state.site, state.markdown.clone()).await?;
    Ok(Html(renderer.render_index(&posts)?))
}

/// `GET /post/{id}` - render a single post
async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let post = state.site.repository().get_post(&id).await?;
    let renderer = Renderer::load(&state.site, state.markdown.clone()).await?;
    Ok(Html(renderer.render_post(&post)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_site(dir: &TempDir) -> Site {
        let root = dir.path();
        fs::create_dir_all(root.join("posts")).unwrap();
        fs::create_dir_all(root.join("public")).unwrap();
        fs::write(
            root.join("posts/hello.md"),
            "---\ntitle: Hello\ndate: 2024-01-01\n---\nHello **world**\n",
        )
        .unwrap();
        fs::write(root.join("posts/_hidden.md"), "---\ntitle: Hidden\n---\n").unwrap();
        fs::write(root.join("public/style.css"), "p { color: red }").unwrap();
        Site::new(root).unwrap()
    }

    fn state(site: &Site) -> State<Arc<ServerState>> {
        State(Arc::new(ServerState {
            site: site.clone(),
            markdown: Arc::new(MarkdownRenderer::new()),
        }))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_index_handler() {
        let dir = TempDir::new().unwrap();
        let site = test_site(&dir);

        let response = index_handler(state(&site)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains(r#"<a href="/post/hello/">Hello</a>"#));
        assert!(!body.contains("Hidden"));
    }

    #[tokio::test]
    async fn test_index_reads_fresh_from_disk() {
        let dir = TempDir::new().unwrap();
        let site = test_site(&dir);
        let state = state(&site);

        let first = body_text(index_handler(state.clone()).await.into_response()).await;
        assert!(!first.contains("Later"));

        fs::write(site.posts_dir.join("later.md"), "---\ntitle: Later\n---\n").unwrap();
        let second = body_text(index_handler(state).await.into_response()).await;
        assert!(second.contains("Later"));
    }

    #[tokio::test]
    async fn test_post_handler() {
        let dir = TempDir::new().unwrap();
        let site = test_site(&dir);

        let response = post_handler(state(&site), Path("hello".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("<strong>world</strong>"));
    }

    #[tokio::test]
    async fn test_post_handler_not_found() {
        let dir = TempDir::new().unwrap();
        let site = test_site(&dir);

        for id in ["missing", "_hidden"] {
            let response = post_handler(state(&site), Path(id.to_string()))
                .await
                .into_response();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(body_text(response).await, "Post not found");
        }
    }

    #[tokio::test]
    async fn test_malformed_post_is_internal_error() {
        let dir = TempDir::new().unwrap();
        let site = test_site(&dir);
        fs::write(site.posts_dir.join("bad.md"), "---\ntitle: [nope\n---\n").unwrap();

        let response = post_handler(state(&site), Path("bad".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = index_handler(state(&site)).await.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    /// Send a raw HTTP/1.1 GET and return the full response text
    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_router_serves_pages_and_assets() {
        let dir = TempDir::new().unwrap();
        let site = test_site(&dir);
        fs::write(site.posts_dir.join("c#-tips.md"), "---\ntitle: Tips\n---\nSharp").unwrap();
        let app = router(&site, Arc::new(MarkdownRenderer::new()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let index = get(addr, "/").await;
        assert!(index.starts_with("HTTP/1.1 200"));
        assert!(index.contains(r#"href="/post/c%23-tips/""#));

        let post = get(addr, "/post/hello/").await;
        assert!(post.starts_with("HTTP/1.1 200"));
        assert!(post.contains("<strong>world</strong>"));

        let encoded = get(addr, "/post/c%23-tips/").await;
        assert!(encoded.starts_with("HTTP/1.1 200"));
        assert!(encoded.contains("<p>Sharp</p>"));

        let missing = get(addr, "/post/nope").await;
        assert!(missing.starts_with("HTTP/1.1 404"));
        assert!(missing.ends_with("Post not found"));

        for path in ["/public/style.css", "/style.css"] {
            let asset = get(addr, path).await;
            assert!(asset.starts_with("HTTP/1.1 200"), "{}", path);
            assert!(asset.ends_with("p { color: red }"));
        }

        let no_asset = get(addr, "/nothing.css").await;
        assert!(no_asset.starts_with("HTTP/1.1 404"));
    }
}
