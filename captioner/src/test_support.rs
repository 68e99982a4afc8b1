//! Loopback HTTP fixtures for the network-facing modules.

use axum::Router;
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral loopback port and return its base URL.
///
/// `app` receives the base URL so handlers can point back at the fixture.
/// The server lives until the test runtime shuts down.
pub(crate) async fn serve_fixture(app: impl FnOnce(&str) -> Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let router = app(&base);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    base
}
