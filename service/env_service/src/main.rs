use std::net::SocketAddr;

use env_service::{make_app, register_builtin_envs};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    register_builtin_envs();
    let app = make_app();

    let addr: SocketAddr = "127.0.0.1:8080".parse().expect("static listen address");
    info!(%addr, "environment service listening");
    let listener = tokio::net::TcpListener::bind(addr).await.expect("bind listen address");
    axum::serve(listener, app).await.expect("serve");
}
