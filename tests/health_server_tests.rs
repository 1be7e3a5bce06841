//! # Health Server Tests
//!
//! Starts the HTTP health server on an ephemeral port and queries it with
//! reqwest.

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use vocab_bot::config::ServerConfig;
use vocab_bot::observability::start_health_server;
use vocab_bot::storage::{JsonStore, VocabularyStore};

fn local_config(metrics_auth_token: Option<&str>) -> ServerConfig {
    ServerConfig {
        health_port: 0,
        bind_all_interfaces: false,
        metrics_auth_token: metrics_auth_token.map(str::to_string),
        ..ServerConfig::default()
    }
}

async fn get(addr: SocketAddr, path: &str, token: Option<&str>) -> Result<(u16, String)> {
    let mut request = reqwest::Client::new().get(format!("http://{}{}", addr, path));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response = request.send().await?;
    let status = response.status().as_u16();
    Ok((status, response.text().await?))
}

#[tokio::test]
async fn test_liveness_and_readiness() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store: Arc<dyn VocabularyStore> =
        Arc::new(JsonStore::open(dir.path().join("vocab.json")).await?);

    let addr = start_health_server(&local_config(None), store, None).await?;

    assert_eq!(get(addr, "/", None).await?, (200, "OK".to_string()));
    assert_eq!(get(addr, "/health/live", None).await?, (200, "OK".to_string()));
    assert_eq!(get(addr, "/health/ready", None).await?, (200, "OK".to_string()));
    assert_eq!(get(addr, "/unknown", None).await?.0, 404);
    assert_eq!(get(addr, "/metrics", None).await?.0, 404, "metrics disabled");
    Ok(())
}

#[tokio::test]
async fn test_readiness_fails_when_storage_is_unavailable() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store: Arc<dyn VocabularyStore> =
        Arc::new(JsonStore::open(dir.path().join("missing").join("vocab.json")).await?);

    let addr = start_health_server(&local_config(None), store, None).await?;

    let (status, body) = get(addr, "/health/ready", None).await?;
    assert_eq!(status, 503);
    assert!(body.starts_with("NOT READY"));
    assert_eq!(get(addr, "/health/live", None).await?.0, 200);
    Ok(())
}

#[tokio::test]
async fn test_metrics_require_token() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store: Arc<dyn VocabularyStore> =
        Arc::new(JsonStore::open(dir.path().join("vocab.json")).await?);
    let handle = PrometheusBuilder::new().build_recorder().handle();

    let addr = start_health_server(&local_config(Some("secret")), store, Some(handle)).await?;

    assert_eq!(get(addr, "/metrics", None).await?.0, 401);
    assert_eq!(get(addr, "/metrics", Some("wrong")).await?.0, 401);
    assert_eq!(get(addr, "/metrics", Some("secret")).await?.0, 200);
    Ok(())
}
