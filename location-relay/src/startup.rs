//! Application startup and lifecycle management.

use crate::config::{MailConfig, RelayConfig};
use crate::handlers::{health_check, location_page, metrics, submit_location};
use crate::services::{EmailProvider, TokenRegistry};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{ip_rate_limit_middleware, IpRateLimit},
    security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<dyn TokenRegistry>,
    pub email_provider: Arc<dyn EmailProvider>,
    pub mail: Arc<MailConfig>,
}

/// Routes plus the middleware stack. Without `intake_limit` the intake
/// endpoint is unlimited.
pub fn build_router(state: AppState, intake_limit: Option<IpRateLimit>) -> Router {
    let mut intake = Router::new().route("/api/location", post(submit_location));
    if let Some(limit) = intake_limit {
        intake = intake.layer(from_fn_with_state(limit, ip_rate_limit_middleware));
    }

    Router::new()
        .route("/", get(health_check))
        .route("/metrics", get(metrics))
        .route("/loc/:token", get(location_page))
        .merge(intake)
        .route_layer(from_fn(metrics_middleware))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Bind the listener (port 0 = random port for testing) and assemble the
    /// router around the given collaborators.
    pub async fn build(
        config: &RelayConfig,
        email_provider: Arc<dyn EmailProvider>,
        tokens: Arc<dyn TokenRegistry>,
    ) -> Result<Self, AppError> {
        let state = AppState {
            tokens,
            email_provider,
            mail: Arc::new(config.mail.clone()),
        };

        let intake_limit = NonZeroU32::new(config.intake_rate_limit_per_minute)
            .map(|per_minute| IpRateLimit::new(per_minute, config.trust_proxy_headers));
        if let Some(limit) = &intake_limit {
            limit.spawn_pruner(LIMITER_PRUNE_INTERVAL);
        }

        let router = build_router(state, intake_limit);

        let address = format!("{}:{}", config.common.bind_address, config.common.port);
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Location relay listening on {}:{}", config.common.bind_address, port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(
            self.listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            tracing::error!("HTTP server error: {}", e);
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
