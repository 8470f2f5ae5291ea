//! Integration tests spawning the real server on a random port.
//!
//! These use the mock provider selected via `COPYGEN_PROVIDER`.
//! Run with: cargo test -p copygen-service --test health_check

use copygen_service::config::CopygenConfig;
use copygen_service::startup::Application;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Spawn the application on a random port and return the port number.
async fn spawn_app() -> u16 {
    std::env::set_var("APP__PORT", "0"); // Random port
    std::env::set_var("OPENAI_API_KEY", "test-api-key");
    std::env::set_var("COPYGEN_PROVIDER", "mock");

    let config = CopygenConfig::load().expect("Failed to load config");
    let app = Application::build(config)
        .await
        .expect("Failed to build application");

    let port = app.port();

    // Spawn the server in the background
    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    port
}

#[tokio::test]
async fn health_check_returns_ok() {
    let port = spawn_app().await;
    let client = Client::new();

    let response = client
        .get(format!("http://localhost:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "copygen-service");
}

#[tokio::test]
async fn readiness_check_returns_ok() {
    let port = spawn_app().await;
    let client = Client::new();

    let response = client
        .get(format!("http://localhost:{}/ready", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
async fn generate_round_trip_over_http() {
    let port = spawn_app().await;
    let client = Client::new();

    let response = client
        .post(format!("http://localhost:{}/api/generate", port))
        .json(&json!({
            "template": "# {title}\n{body}",
            "productInfo": "Name: Oak chair; Price: 500000",
            "temperature": 1.2
        }))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["text"]
        .as_str()
        .unwrap()
        .contains("Name: Oak chair; Price: 500000"));
}

#[tokio::test]
async fn generate_rejects_missing_fields_over_http() {
    let port = spawn_app().await;
    let client = Client::new();

    let response = client
        .post(format!("http://localhost:{}/api/generate", port))
        .json(&json!({ "template": "", "productInfo": "x" }))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 400);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["error"].as_str().unwrap().contains("template"));
}
