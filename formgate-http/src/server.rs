use crate::handlers;
use crate::middleware::access_log;
use axum::{Router, middleware, routing::any};
use formgate_core::TemplateRegistry;
use formgate_notify::Notifier;
use formgate_store::AppendLog;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Shared state for the front door.
///
/// Registry, append log and notifier are constructed once at startup and
/// injected here; handlers never reach for globals.
pub struct AppState {
    pub base_path: String,
    pub registry: TemplateRegistry,
    pub log: AppendLog,
    pub notifier: Notifier,
}

/// Build the axum router: the healthcheck is a real route resolved first,
/// everything else falls through to the submission handler.
pub fn build_router(state: Arc<AppState>) -> Router {
    let health_path = format!("{}/healthcheck", state.base_path);
    Router::new()
        .route(&health_path, any(handlers::health::health_check))
        .fallback(handlers::submit::handle_submission)
        .layer(middleware::from_fn(access_log))
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves; in-flight requests are
/// allowed to finish.
pub async fn start(
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let routes = state.registry.route_names();
    let app = build_router(state);

    info!(addr = %addr, routes = ?routes, "Starting front door");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    Ok(())
}
