// ABOUTME: HTTP server bootstrap wiring routes, middleware layers and graceful shutdown
// ABOUTME: Binds a TcpListener and serves the axum router until ctrl-c or SIGTERM
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `SmartPlates` HTTP Server
//!
//! Layer order, outermost first: request id, tracing, request id propagation,
//! CORS, body limit, response headers, inbound rate limiting.

use crate::middleware::{rate_limit_middleware, setup_cors};
use crate::resources::ServerResources;
use crate::routes::api_router;
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::{middleware as axum_middleware, Router};
use http::header::X_CONTENT_TYPE_OPTIONS;
use http::HeaderValue;
use std::future::pending;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
#[cfg(unix)]
use tokio::signal::unix::{signal as unix_signal, SignalKind};
use tokio::time::interval;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Largest accepted request body; fridge photos arrive base64 encoded
pub const MAX_REQUEST_BODY_BYTES: usize = 10 * 1024 * 1024;

const LIMITER_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// The `SmartPlates` HTTP server
pub struct SmartPlatesServer {
    resources: Arc<ServerResources>,
}

impl SmartPlatesServer {
    /// Create a server over shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Shared resources
    #[must_use]
    pub const fn resources(&self) -> &Arc<ServerResources> {
        &self.resources
    }

    /// Build the full application router with every middleware layer
    pub fn router(&self) -> Router {
        build_router(&self.resources)
    }

    /// Bind `0.0.0.0:port` and serve until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound or the server fails
    pub async fn run(self, port: u16) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind HTTP port {port}"))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        self.spawn_limiter_sweeper();

        let app = self.router();
        info!("SmartPlates server listening on http://{local_addr}");

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

        info!("SmartPlates server stopped");
        Ok(())
    }

    /// Periodically drop fully elapsed inbound rate limit windows
    fn spawn_limiter_sweeper(&self) {
        let Some(limiter) = self.resources.inbound_limiter.clone() else {
            return;
        };
        tokio::spawn(async move {
            let mut ticker = interval(LIMITER_SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                let removed = limiter.purge_expired();
                if removed > 0 {
                    debug!(removed, "Purged expired rate limit windows");
                }
            }
        });
    }
}

/// Build the application router; tests drive it with `tower::ServiceExt::oneshot`
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    api_router(resources)
        .layer(axum_middleware::from_fn_with_state(
            resources.clone(),
            rate_limit_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(setup_cors(&resources.config.cors))
                .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
                .layer(SetResponseHeaderLayer::if_not_present(
                    X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                )),
        )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
        }
        info!("Received ctrl-c, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match unix_signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
