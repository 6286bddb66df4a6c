//! HTTP Server configuration and startup.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use lnrelay_types::WalletConnector;
use lnrelay_types::ports::PriceOracle;

use super::auth::{ApiKeyAuth, auth_middleware};
use super::handlers::{self, AppState};
use super::rate_limit::{RateLimiterState, rate_limit_middleware};
use crate::openapi::ApiDoc;

/// HTTP Server for the relay API.
pub struct HttpServer<C: WalletConnector, O: PriceOracle> {
    state: Arc<AppState<C, O>>,
    auth: ApiKeyAuth,
    rate_limiter: Arc<RateLimiterState>,
}

impl<C: WalletConnector, O: PriceOracle> HttpServer<C, O> {
    /// Creates a new HTTP server with the default rate limit.
    pub fn new(state: AppState<C, O>, auth: ApiKeyAuth) -> Self {
        Self {
            state: Arc::new(state),
            auth,
            rate_limiter: Arc::new(RateLimiterState::default()),
        }
    }

    /// Creates a new HTTP server with custom rate limiting.
    pub fn with_rate_limit(state: AppState<C, O>, auth: ApiKeyAuth, requests_per_minute: u32) -> Self {
        Self {
            state: Arc::new(state),
            auth,
            rate_limiter: Arc::new(RateLimiterState::new(
                requests_per_minute,
                Duration::from_secs(60),
            )),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        // Build HTTP metrics layer (uses globally set MeterProvider)
        let metrics = axum_otel_metrics::HttpMetricsLayerBuilder::new().build();

        Router::new()
            .route("/health", get(handlers::health::<C, O>))
            .route("/nwc_payment", post(handlers::nwc_payment::<C, O>))
            .route(
                "/convert/eur-to-msats",
                get(handlers::convert_eur_to_msats::<C, O>),
            )
            .with_state(self.state.clone())
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
            .layer(metrics)
            .layer(middleware::from_fn_with_state(
                self.rate_limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                self.auth.clone(),
                auth_middleware,
            ))
            .layer(cors_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

/// Any origin, mirrored back so credentials stay allowed.
fn cors_layer() -> CorsLayer {
    let api_key = HeaderName::from_static("x-api-key");

    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            api_key.clone(),
            header::AUTHORIZATION,
        ])
        .expose_headers([header::CONTENT_LENGTH, api_key])
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
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

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}

