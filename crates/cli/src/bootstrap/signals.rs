use tracing::info;

/// Resolves once SIGINT or SIGTERM is received. Awaited alongside
/// `axum::serve`'s graceful shutdown and used to cancel the registry's
/// process-root [`tokio_util::sync::CancellationToken`], which cascades
/// down through every DNS auto-discover loop and host scanner.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
