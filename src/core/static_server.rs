// Static file server for the try-on page and its assets

use axum::Router;
use std::net::SocketAddr;
use std::path::Path;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::info;

/// Router serving every file under `root`. There are no other routes.
pub fn router(root: &Path) -> Router {
    Router::new().fallback_service(ServeDir::new(root))
}

/// Serve `root` on an already bound listener until the process is stopped.
pub async fn serve_on(listener: TcpListener, root: &Path) -> std::io::Result<()> {
    axum::serve(listener, router(root)).await
}

/// Bind `addr` and serve `root`.
pub async fn serve(addr: SocketAddr, root: &Path) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Serving static files from: {}", root.display());
    info!("Server running on port {}", listener.local_addr()?.port());
    serve_on(listener, root).await
}
