//! Application startup and lifecycle management.
//!
//! Builds the HTTP router, binds the listener and runs the server with a
//! bounded graceful shutdown.

use crate::config::StimuliConfig;
use crate::handlers::{
    app::{index, not_found},
    generation::{handle_generation, GENERATION_ROUTES},
    health::ping,
    metrics::metrics,
};
use crate::middleware::{cors_middleware, metrics_middleware};
use crate::services::metrics::init_metrics;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::TextProvider;
use crate::services::Generator;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, REQUEST_ID_HEADER};
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

/// Shared application state. Everything in it is immutable.
#[derive(Clone)]
pub struct AppState {
    pub generator: Generator,
    pub static_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(generator: Generator, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            generator,
            static_dir: Arc::new(static_dir.into()),
        }
    }
}

/// Build the full HTTP router for the given state.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(index).fallback(not_found))
        .route("/api/ping", get(ping).fallback(not_found))
        .route("/metrics", get(metrics).fallback(not_found));

    for route in GENERATION_ROUTES.iter() {
        router = router.route(
            &format!("/api/{}", route.path),
            post(
                move |State(state): State<AppState>, body: Result<Bytes, BytesRejection>| {
                    handle_generation(state, route, body)
                },
            )
            .fallback(not_found),
        );
    }

    router
        .fallback(not_found)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(cors_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
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
    state: AppState,
    shutdown_grace: Duration,
}

impl Application {
    /// Build the application with the Gemini provider.
    pub async fn build(config: StimuliConfig) -> Result<Self, AppError> {
        let provider = GeminiTextProvider::new(GeminiConfig {
            api_key: config.google.api_key.clone(),
            model: config.models.text_model.clone(),
        })
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        tracing::info!(
            model = %config.models.text_model,
            "Initialized Gemini text provider"
        );

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application around an arbitrary provider.
    pub async fn build_with_provider(
        config: StimuliConfig,
        provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        init_metrics();

        let state = AppState::new(Generator::new(provider), config.server.static_dir.clone());

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Stimuli service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
            shutdown_grace: Duration::from_secs(config.server.shutdown_grace_seconds),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run until SIGINT/SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `signal` resolves, then drain in-flight requests for at most
    /// the configured grace period.
    pub async fn run_until<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state);
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let server = axum::serve(self.listener, router).with_graceful_shutdown(async move {
            signal.await;
            let _ = stop_tx.send(true);
        })
        .into_future();

        let grace = self.shutdown_grace;
        let deadline = async move {
            if stop_rx.wait_for(|stopped| *stopped).await.is_err() {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(grace).await;
        };

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    tracing::error!("HTTP server error: {}", e);
                    return Err(std::io::Error::other(format!("HTTP server error: {}", e)));
                }
                tracing::info!("Server stopped");
                Ok(())
            }
            _ = deadline => {
                tracing::error!(
                    grace_seconds = grace.as_secs(),
                    "Could not close connections in time, forcing shutdown"
                );
                Err(std::io::Error::other("graceful shutdown timed out"))
            }
        }
    }
}
