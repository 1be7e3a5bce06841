//! Metrics collection and the HTTP health server.
//!
//! This module provides:
//! - Rate limiting for HTTP requests
//! - Authentication for the metrics endpoint
//! - The hyper server behind `/`, `/health/live`, `/health/ready` and `/metrics`
//! - Metrics recording functions used across the bot

use anyhow::Result;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::errors::error_logging;
use crate::observability_config::ObservabilityConfig;
use crate::storage::VocabularyStore;

/// Requests allowed per client IP and window
const RATE_LIMIT_REQUESTS: u32 = 60;
const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Simple rate limiter for HTTP requests
#[derive(Debug)]
pub struct RateLimiter {
    requests: Mutex<HashMap<String, Vec<Instant>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Check if request is allowed for the given IP
    pub fn is_allowed(&self, ip: &str) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.lock();

        // Forget clients whose window has fully expired
        requests.retain(|_, times| {
            times.retain(|&time| now.duration_since(time) < self.window);
            !times.is_empty()
        });

        let client_requests = requests.entry(ip.to_string()).or_default();
        if client_requests.len() >= self.max_requests as usize {
            return false;
        }

        client_requests.push(now);
        true
    }
}

/// Check the bearer token of a request against the configured one
pub fn check_auth<B>(req: &Request<B>, expected_token: Option<&str>) -> bool {
    let Some(expected_token) = expected_token else {
        return true; // No token required if not set
    };

    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected_token)
}

/// Initialize metrics collection with Prometheus exporter and configuration
pub fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<Option<PrometheusHandle>> {
    if !config.enable_metrics_export {
        tracing::info!("Metrics export disabled");
        return Ok(None);
    }

    let handle = PrometheusBuilder::new().install_recorder()?;

    tracing::info!(
        metrics_enabled = %config.enable_metrics_export,
        "Metrics collection initialized"
    );
    Ok(Some(handle))
}

/// Shared state of the health server
#[derive(Clone)]
struct HealthServerState {
    store: Arc<dyn VocabularyStore>,
    metrics_handle: Option<PrometheusHandle>,
    metrics_auth_token: Option<String>,
    rate_limiter: Arc<RateLimiter>,
    started_at: Instant,
}

fn text_response(status: StatusCode, body: impl Into<String>) -> Response<String> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response
}

async fn route_request(
    req: Request<Incoming>,
    peer_ip: IpAddr,
    state: HealthServerState,
) -> Result<Response<String>, Infallible> {
    let start = Instant::now();

    if !state.rate_limiter.is_allowed(&peer_ip.to_string()) {
        return Ok(text_response(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded",
        ));
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = match (method, path.as_str()) {
        (Method::GET, "/") | (Method::GET, "/health/live") => text_response(StatusCode::OK, "OK"),
        (Method::GET, "/health/ready") => {
            match crate::observability::health_checks::perform_readiness_checks(
                state.store.as_ref(),
            )
            .await
            {
                Ok(()) => text_response(StatusCode::OK, "OK"),
                Err(e) => text_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("NOT READY: {}", e),
                ),
            }
        }
        (Method::GET, "/metrics") => match &state.metrics_handle {
            Some(handle) if check_auth(&req, state.metrics_auth_token.as_deref()) => {
                record_uptime(state.started_at.elapsed().as_secs_f64());
                let mut response = text_response(StatusCode::OK, handle.render());
                response.headers_mut().insert(
                    hyper::header::CONTENT_TYPE,
                    hyper::header::HeaderValue::from_static(
                        "text/plain; version=0.0.4; charset=utf-8",
                    ),
                );
                response
            }
            Some(_) => {
                let mut response = text_response(StatusCode::UNAUTHORIZED, "Unauthorized");
                response.headers_mut().insert(
                    hyper::header::WWW_AUTHENTICATE,
                    hyper::header::HeaderValue::from_static("Bearer"),
                );
                response
            }
            None => text_response(StatusCode::NOT_FOUND, "Metrics export disabled"),
        },
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    };

    record_request_metrics("health_server", response.status().as_u16(), start.elapsed());
    Ok(response)
}

/// Address the health server binds to
pub fn health_server_addr(config: &ServerConfig) -> SocketAddr {
    if config.bind_all_interfaces {
        SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), config.health_port)
    } else {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), config.health_port)
    }
}

/// Bind the health server and serve it on a background task
///
/// Binding happens before returning so a taken port fails startup.
pub async fn start_health_server(
    config: &ServerConfig,
    store: Arc<dyn VocabularyStore>,
    metrics_handle: Option<PrometheusHandle>,
) -> Result<SocketAddr> {
    let addr = health_server_addr(config);
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(addr = %local_addr, bind_all = config.bind_all_interfaces, "Health server listening");

    let state = HealthServerState {
        store,
        metrics_handle,
        metrics_auth_token: config.metrics_auth_token.clone(),
        rate_limiter: Arc::new(RateLimiter::new(
            RATE_LIMIT_REQUESTS,
            RATE_LIMIT_WINDOW_SECS,
        )),
        started_at: Instant::now(),
    };

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let state = state.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let service =
                            hyper::service::service_fn(move |req: Request<Incoming>| {
                                route_request(req, peer_addr.ip(), state.clone())
                            });

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await
                        {
                            error_logging::log_network_error(
                                &err,
                                "serve_http_connection",
                                Some(&peer_addr.to_string()),
                            );
                        }
                    });
                }
                Err(e) => {
                    error_logging::log_network_error(
                        &e,
                        "accept_tcp_connection",
                        Some(&local_addr.to_string()),
                    );
                }
            }
        }
    });

    Ok(local_addr)
}

/// Record storage operation metrics
pub fn record_storage_metrics(operation: &str, backend: &str, duration: Duration) {
    let operation = operation.to_string();
    let backend = backend.to_string();
    metrics::counter!("storage_operations_total", "operation" => operation.clone(), "backend" => backend.clone()).increment(1);
    metrics::histogram!("storage_operation_duration_seconds", "operation" => operation, "backend" => backend)
        .record(duration.as_secs_f64());
}

/// Record text-to-speech request metrics
pub fn record_tts_metrics(success: bool, duration: Duration) {
    metrics::counter!("tts_requests_total", "result" => if success { "success" } else { "failure" }).increment(1);
    metrics::histogram!("tts_duration_seconds").record(duration.as_secs_f64());
}

/// Update circuit breaker state metric
pub fn update_circuit_breaker_state(is_open: bool) {
    metrics::gauge!("tts_circuit_breaker_state").set(if is_open { 1.0 } else { 0.0 });
}

/// Record request metrics
pub fn record_request_metrics(method: &str, status: u16, duration: Duration) {
    let method = method.to_string();
    let status = status.to_string();
    metrics::counter!("requests_total", "method" => method, "status" => status).increment(1);
    metrics::histogram!("request_duration_seconds").record(duration.as_secs_f64());
}

/// Record health check metrics
pub fn record_health_check_metrics(check_type: &str, success: bool, duration: Duration) {
    let check_type = check_type.to_string();
    metrics::counter!("health_checks_total", "type" => check_type.clone(), "result" => if success { "success" } else { "failure" }.to_string()).increment(1);
    metrics::histogram!("health_check_duration_seconds", "type" => check_type.clone())
        .record(duration.as_secs_f64());

    // Update health status gauge
    metrics::gauge!("health_check_status", "type" => check_type).set(if success {
        1.0
    } else {
        0.0
    });
}

/// Record application uptime
pub fn record_uptime(uptime_secs: f64) {
    metrics::gauge!("application_uptime_seconds").set(uptime_secs);
}

/// Record application startup metrics
pub fn record_startup_metrics(duration: Duration) {
    metrics::histogram!("application_startup_duration_seconds").record(duration.as_secs_f64());
    metrics::counter!("application_starts_total").increment(1);
}

/// Record Telegram message processing metrics
pub fn record_telegram_message(message_type: &str) {
    let message_type = message_type.to_string();
    metrics::counter!("telegram_messages_total", "type" => message_type).increment(1);
}

/// Record a bot command
pub fn record_command(command: &str) {
    let command = command.to_string();
    metrics::counter!("telegram_commands_total", "command" => command).increment(1);
}

/// Record a callback button press
pub fn record_callback(action: &str) {
    let action = action.to_string();
    metrics::counter!("telegram_callbacks_total", "action" => action).increment(1);
}

/// Record a change to a user's dictionary
pub fn record_word_operation(operation: WordOperation, success: bool) {
    let operation = match operation {
        WordOperation::Added => "added",
        WordOperation::Updated => "updated",
        WordOperation::Deleted => "deleted",
        WordOperation::Cleared => "cleared",
        WordOperation::Rejected => "rejected",
    };
    metrics::counter!(
        "word_operations_total",
        "operation" => operation,
        "result" => if success { "success" } else { "failure" }
    )
    .increment(1);
}

/// Dictionary change kinds for [`record_word_operation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordOperation {
    /// A new word pair was stored
    Added,
    /// An existing word got a new translation
    Updated,
    /// `/delete` removed a word
    Deleted,
    /// `/clear` removed the whole dictionary
    Cleared,
    /// The text did not parse as a word pair
    Rejected,
}

/// Record a scored quiz answer
pub fn record_quiz_answer(correct: bool) {
    metrics::counter!("quiz_answers_total", "result" => if correct { "correct" } else { "wrong" })
        .increment(1);
}

/// Record a quiz starting or finishing
pub fn record_quiz_session(started: bool) {
    metrics::counter!("quiz_sessions_total", "event" => if started { "started" } else { "finished" })
        .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_blocks_after_limit() {
        let limiter = RateLimiter::new(2, 60);
        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(!limiter.is_allowed("10.0.0.1"));
        // Other clients have their own budget
        assert!(limiter.is_allowed("10.0.0.2"));
    }

    #[test]
    fn test_rate_limiter_window_expires() {
        let limiter = RateLimiter::new(1, 0);
        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(limiter.is_allowed("10.0.0.1"));
    }

    #[test]
    fn test_check_auth() {
        let request = Request::builder()
            .uri("/metrics")
            .header("authorization", "Bearer secret")
            .body(())
            .unwrap();
        assert!(check_auth(&request, None));
        assert!(check_auth(&request, Some("secret")));
        assert!(!check_auth(&request, Some("other")));

        let anonymous = Request::builder().uri("/metrics").body(()).unwrap();
        assert!(!check_auth(&anonymous, Some("secret")));
    }

    #[test]
    fn test_health_server_addr() {
        let mut config = ServerConfig {
            health_port: 9000,
            ..ServerConfig::default()
        };
        assert_eq!(health_server_addr(&config).port(), 9000);
        assert!(health_server_addr(&config).ip().is_unspecified());

        config.bind_all_interfaces = false;
        assert!(health_server_addr(&config).ip().is_loopback());
    }
}
