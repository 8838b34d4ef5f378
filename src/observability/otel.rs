//! # OpenTelemetry Support
//!
//! Datadog trace export via `datadog-opentelemetry`.
//!
//! Export is enabled only when `DD_API_KEY` is present in the environment.
//! The remaining `DD_*` variables are read by `datadog-opentelemetry` during
//! initialization; missing ones are filled with controller defaults.

use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

/// Tracer provider handle for graceful shutdown
#[derive(Debug)]
pub enum TracerProviderHandle {
    /// Datadog tracer provider
    Datadog(opentelemetry_sdk::trace::SdkTracerProvider),
}

/// Initialize Datadog tracing from the environment
///
/// Returns `Ok(None)` when `DD_API_KEY` is not set.
///
/// # Errors
///
/// Reserved for exporter configuration failures.
pub fn init_otel() -> Result<Option<TracerProviderHandle>> {
    if std::env::var("DD_API_KEY").is_err() {
        info!("DD_API_KEY not set, skipping Datadog tracing initialization");
        return Ok(None);
    }
    init_datadog()
}

fn init_datadog() -> Result<Option<TracerProviderHandle>> {
    if std::env::var("DD_SERVICE").is_err() {
        std::env::set_var("DD_SERVICE", "pushsecret-controller");
    }

    // Version carries the git hash captured by build.rs
    if std::env::var("DD_VERSION").is_err() {
        let build_version = format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("BUILD_GIT_HASH"));
        std::env::set_var("DD_VERSION", build_version);
    }

    if std::env::var("DD_SITE").is_err() {
        std::env::set_var("DD_SITE", "datadoghq.com");
    }

    if std::env::var("DD_TRACE_AGENT_URL").is_err() {
        std::env::set_var("DD_TRACE_AGENT_URL", "http://localhost:8126");
    }

    info!(
        "Initializing Datadog OpenTelemetry tracing: service={}, version={}, env={:?}, site={}",
        std::env::var("DD_SERVICE").unwrap_or_default(),
        std::env::var("DD_VERSION").unwrap_or_default(),
        std::env::var("DD_ENV").ok(),
        std::env::var("DD_SITE").unwrap_or_default()
    );

    let tracer_provider = datadog_opentelemetry::tracing().init();

    info!(
        "Datadog tracing initialized, sending traces to {}",
        std::env::var("DD_TRACE_AGENT_URL").unwrap_or_default()
    );

    Ok(Some(TracerProviderHandle::Datadog(tracer_provider)))
}

/// Flush pending spans and shut the tracer provider down
pub fn shutdown_otel(tracer_provider: Option<TracerProviderHandle>) {
    if let Some(TracerProviderHandle::Datadog(provider)) = tracer_provider {
        info!("Shutting down Datadog tracer provider...");
        if let Err(e) = provider.shutdown_with_timeout(Duration::from_secs(5)) {
            warn!("Error shutting down Datadog tracer provider: {}", e);
        } else {
            info!("Datadog tracer provider shut down");
        }
    }
}
