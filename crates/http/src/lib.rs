//! HTTP server facade for Shelf with Axum, error handling, and OpenAPI support.

use std::future::Future;

use anyhow::Context;
use axum::{routing::get, Router};

use shelf_kernel::{InitCtx, ModuleRegistry};

pub mod error;
pub mod extract;
pub mod router;

use router::RouterBuilder;

/// Start the HTTP server and serve until `shutdown` resolves
pub async fn start_server<F>(
    registry: &ModuleRegistry,
    ctx: &InitCtx<'_>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let server = &ctx.settings.server;
    tracing::info!("starting HTTP server on {}:{}", server.host, server.port);

    let app = build_router(registry, ctx).context("failed to build HTTP router")?;

    let listener = tokio::net::TcpListener::bind((server.host.as_str(), server.port))
        .await
        .context("failed to bind to address")?;

    tracing::info!(
        "HTTP server listening on http://{}",
        listener.local_addr().context("listener has no local address")?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, ctx: &InitCtx<'_>) -> anyhow::Result<Router> {
    let mut router_builder = RouterBuilder::new();

    // Add health check route
    router_builder = router_builder.route("/healthz", get(health_check));

    for module in registry.modules() {
        tracing::info!(module = module.name(), "mounting module routes");
        router_builder = router_builder.mount_module(module.routes(ctx));
    }

    router_builder = router_builder.with_openapi(registry);

    let origins = router::parse_origins(&ctx.settings.cors.allowed_origins)?;

    // Global middlewares wrap every route registered above
    router_builder = router_builder
        .with_tracing()
        .with_cors(origins)
        .with_request_id()
        .with_timeout(ctx.settings.server.request_timeout_ms);

    Ok(router_builder.build())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
