//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Structured logging with configurable levels and formats
//! - Distributed tracing with OpenTelemetry
//! - Metrics collection and Prometheus export
//! - The HTTP health server used by hosting platforms

pub mod health_checks;
pub mod metrics;
pub mod tracing_mod;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use opentelemetry_sdk::trace::SdkTracerProvider;

use crate::observability_config::ObservabilityConfig;

pub use health_checks::{check_storage_health, perform_readiness_checks, start_health_metrics_recorder};
pub use metrics::{
    record_callback, record_command, record_health_check_metrics, record_quiz_answer,
    record_quiz_session, record_request_metrics, record_startup_metrics, record_storage_metrics,
    record_telegram_message, record_tts_metrics, record_word_operation, start_health_server,
    update_circuit_breaker_state, WordOperation,
};
pub use tracing_mod::{storage_span, telegram_span};

/// Handles kept alive for the lifetime of the process
#[derive(Default)]
pub struct ObservabilityHandles {
    /// Prometheus renderer, present when metrics export is enabled
    pub metrics_handle: Option<PrometheusHandle>,
    tracer_provider: Option<SdkTracerProvider>,
}

impl ObservabilityHandles {
    /// Flush pending spans before exit
    pub fn shutdown(self) {
        if let Some(provider) = self.tracer_provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Failed to flush OpenTelemetry spans");
            }
        }
    }
}

/// Initialize the complete observability stack with custom configuration
pub fn init_observability_with_config(config: &ObservabilityConfig) -> Result<ObservabilityHandles> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    // Initialize tracing first
    tracing_mod::init_tracing_with_config(config)?;

    let metrics_handle = metrics::init_metrics_with_config(config)?;
    let tracer_provider = tracing_mod::init_opentelemetry_tracing_with_config(config)?;

    tracing::info!(
        environment = %config.environment,
        otlp_endpoint = ?config.otlp_endpoint,
        metrics_enabled = metrics_handle.is_some(),
        "Observability stack initialized successfully"
    );

    Ok(ObservabilityHandles {
        metrics_handle,
        tracer_provider,
    })
}
