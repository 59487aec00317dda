use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub async fn serve(service_name: &'static str, addr: SocketAddr, router: Router) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(service = service_name, %addr, "listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(service_name))
    .await?;

    tracing::info!(service = service_name, "stopped");
    Ok(())
}

async fn shutdown_signal(service_name: &'static str) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!(service = service_name, "shutdown requested");
    }
}
