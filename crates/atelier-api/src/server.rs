//! HTTP server loop.

use std::net::SocketAddr;

use atelier_core::{AppState, ConfigProvider, Error, Result};
use tokio::net::TcpListener;

use crate::routes::{ApiOptions, router};

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve<C: ConfigProvider>(
    state: AppState<C>,
    options: &ApiOptions,
    addr: SocketAddr,
) -> Result<()> {
    let listener = TcpListener::bind(addr).await.map_err(Error::io)?;
    serve_listener(state, options, listener, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_listener<C, F>(
    state: AppState<C>,
    options: &ApiOptions,
    listener: TcpListener,
    shutdown: F,
) -> Result<()>
where
    C: ConfigProvider,
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = router(state.clone(), options);
    let local = listener.local_addr().map_err(Error::io)?;
    tracing::info!(
        "{} listening on http://{local} ({} projects)",
        state.config().app_name(),
        state.service().list_projects().await.len()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(Error::io)?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
