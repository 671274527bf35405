//! End-to-end tests against a live listener.
//!
//! The application binds a random port and is driven with a real HTTP client.

use reqwest::Client;
use service_core::config::Config;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stimuli_service::config::{
    GoogleConfig, ModelConfig, ObservabilityConfig, ServerConfig, StimuliConfig,
};
use stimuli_service::services::providers::mock::MockTextProvider;
use stimuli_service::startup::Application;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

fn test_config() -> StimuliConfig {
    StimuliConfig {
        common: Config {
            port: 0, // Random port
            log_level: "info".to_string(),
        },
        models: ModelConfig {
            text_model: "gemini-2.0-flash".to_string(),
        },
        google: GoogleConfig {
            api_key: "test-api-key".to_string(),
        },
        server: ServerConfig {
            static_dir: PathBuf::from("static"),
            shutdown_grace_seconds: 1,
        },
        observability: ObservabilityConfig {
            otlp_endpoint: None,
        },
    }
}

struct TestApp {
    port: u16,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

/// Spawn the application on a random port.
async fn spawn_app() -> TestApp {
    let provider = Arc::new(MockTextProvider::with_text("Count me in!"));
    let app = Application::build_with_provider(test_config(), provider)
        .await
        .expect("Failed to build application");

    let port = app.port();
    let (stop, stopped) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        app.run_until(async move {
            let _ = stopped.await;
        })
        .await
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    TestApp { port, stop, handle }
}

#[tokio::test]
async fn ping_returns_awake() {
    let app = spawn_app().await;
    let client = Client::new();

    let response = client
        .get(format!("http://localhost:{}/api/ping", app.port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "awake");

    let _ = app.stop.send(());
}

#[tokio::test]
async fn reply_round_trip_over_http() {
    let app = spawn_app().await;
    let client = Client::new();

    let response = client
        .post(format!("http://localhost:{}/api/generate-reply", app.port))
        .json(&serde_json::json!({ "parentCommentText": "Who is coming?" }))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["replyText"], "Count me in!");

    let _ = app.stop.send(());
}

#[tokio::test]
async fn server_stops_cleanly_on_signal() {
    let app = spawn_app().await;

    let _ = app.stop.send(());
    let result = tokio::time::timeout(Duration::from_secs(5), app.handle)
        .await
        .expect("Server did not stop in time")
        .expect("Server task panicked");

    assert!(result.is_ok());
}
