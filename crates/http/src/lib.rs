//! HTTP server facade for bookshelf with Axum, error envelopes, validation and OpenAPI support.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use axum::{routing::get, Extension, Router};
use tokio_util::sync::CancellationToken;

use bookshelf_kernel::{settings::Settings, ModuleRegistry};

pub mod error;
pub mod extract;
pub mod rate_limit;
pub mod response;
pub mod router;
pub mod validation;

use router::RouterBuilder;

/// Serve the module routes until `shutdown` is cancelled.
///
/// After `shutdown` fires the listener stops accepting and in-flight requests
/// are drained. Requests still running after `server.shutdown_timeout_ms`
/// have their cancellation tokens fired so pending store calls abort.
pub async fn start_server(
    registry: &ModuleRegistry,
    settings: &Settings,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let address = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!("starting HTTP server on {}", address);

    let abort = CancellationToken::new();
    let app = build_router(registry, settings).layer(Extension(abort.clone()));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind to {}", address))?;

    tracing::info!("HTTP server listening on http://{}", address);

    let grace = Duration::from_millis(settings.server.shutdown_timeout_ms);
    let watchdog = tokio::spawn({
        let shutdown = shutdown.clone();
        let abort = abort.clone();
        async move {
            shutdown.cancelled().await;
            tokio::time::sleep(grace).await;
            tracing::warn!(
                grace_ms = grace.as_millis() as u64,
                "shutdown grace period elapsed; aborting in-flight requests"
            );
            abort.cancel();
        }
    });

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("HTTP server failed");

    watchdog.abort();
    tracing::info!("HTTP server stopped");

    served
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, settings: &Settings) -> Router {
    let mut router_builder = RouterBuilder::new()
        .route("/healthz", get(health_check))
        .with_heartbeat();

    for module in registry.modules() {
        let module_name = module.name();
        tracing::info!(
            module = module_name,
            "mounting module routes under {}/{}",
            router::API_PREFIX,
            module_name
        );
        router_builder = router_builder.mount_module(module_name, module.routes());
    }

    if settings.docs_enabled() {
        router_builder = router_builder.with_openapi(registry);
    }

    router_builder = router_builder.with_panic_recovery();
    if settings.server.max_in_flight > 0 {
        router_builder = router_builder.with_concurrency_limit(settings.server.max_in_flight);
    }
    router_builder = router_builder.with_timeout(settings.server.request_timeout_ms);
    if let Some(quota) = NonZeroU32::new(settings.server.rate_limit_per_minute) {
        router_builder = router_builder.with_rate_limit(quota);
    }

    router_builder
        .with_cors()
        .with_tracing()
        .with_request_id()
        .build()
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
