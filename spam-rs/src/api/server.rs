//! API Server - HTTP server for the classification API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::{self, AppState};
use crate::config::Config;
use crate::error::Result;
use crate::security::{rate_limit_middleware, RateLimiter};

/// Build the router
///
/// `/` and `/check-mail` sit behind the rate limiter when one is given;
/// `/health` is never limited.
pub fn build_router(state: Arc<AppState>, rate_limiter: Option<Arc<RateLimiter>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut limited_routes = Router::new()
        .route("/", get(handlers::home))
        .route("/check-mail", post(handlers::check_mail));

    if let Some(limiter) = rate_limiter {
        limited_routes = limited_routes
            .route_layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    let public_routes = Router::new().route("/health", get(handlers::health));

    Router::new()
        .merge(limited_routes)
        .merge(public_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// API Server configuration
pub struct ApiServer {
    state: Arc<AppState>,
    rate_limiter: Option<Arc<RateLimiter>>,
    addr: String,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(state: Arc<AppState>, config: &Config) -> Self {
        let rate_limiter = if config.rate_limit.enabled {
            info!(
                "Rate limiting: {} requests per {}s per client",
                config.rate_limit.max_requests, config.rate_limit.window_seconds
            );
            Some(Arc::new(RateLimiter::from_config(&config.rate_limit)))
        } else {
            info!("Rate limiting: disabled");
            None
        };

        Self {
            state,
            rate_limiter,
            addr: config.server.listen_addr.clone(),
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone(), self.rate_limiter.clone())
    }

    /// Start the API server and serve until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        let router = self.router();

        if let Some(limiter) = &self.rate_limiter {
            limiter.clone().start_cleanup_task();
        }

        info!("Starting API server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
