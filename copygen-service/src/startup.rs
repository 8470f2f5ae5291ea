//! Application startup and lifecycle management.

use crate::config::{CopygenConfig, ProviderKind};
use crate::handlers;
use crate::services::providers::mock::MockTextProvider;
use crate::services::providers::openai::OpenAiTextProvider;
use crate::services::providers::TextProvider;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use secrecy::ExposeSecret;
use serde_json::json;
use service_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: CopygenConfig,
    pub provider: Arc<dyn TextProvider>,
    /// Resolved once at startup; requests short-circuit with a
    /// server-configuration error when no key is present.
    pub api_key_configured: bool,
}

/// Health check endpoint for liveness probes.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.provider.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "copygen-service",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": "copygen-service",
                "error": e.to_string()
            })),
        ),
    }
}

/// Readiness check endpoint.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    if state.api_key_configured {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Build the full router; exposed so tests can drive it without a listener.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/generate",
            post(handlers::generate).fallback(handlers::method_not_allowed),
        )
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Construct the configured provider and the derived application state.
pub fn build_state(config: CopygenConfig) -> AppState {
    let provider: Arc<dyn TextProvider> = match config.generation.provider {
        ProviderKind::Mock => {
            tracing::info!("Using mock text provider");
            Arc::new(MockTextProvider::new())
        }
        ProviderKind::OpenAi => {
            tracing::info!(
                model = %config.generation.default_model,
                "Initialized OpenAI text provider"
            );
            Arc::new(OpenAiTextProvider::new(config.openai.clone()))
        }
    };

    let api_key_configured = !config.openai.api_key.expose_secret().trim().is_empty();
    if !api_key_configured {
        tracing::warn!("OPENAI_API_KEY is not set; generation requests will be rejected");
    }

    AppState {
        config,
        provider,
        api_key_configured,
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: CopygenConfig) -> Result<Self, AppError> {
        let state = build_state(config);

        // Port 0 binds a random port for testing.
        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("copygen-service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped or a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = api_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
