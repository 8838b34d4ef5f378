//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `pushsecret_reconciliations_total` - Total number of reconciliations
//! - `pushsecret_reconciliation_errors_total` - Total number of reconciliation errors
//! - `pushsecret_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `pushsecret_syncs_total` - Publish attempts by outcome
//! - `pushsecret_parameters_published_total` - Parameters written to Parameter Store
//! - `pushsecret_deletions_total` - Delete batches by path (authoritative/opportunistic) and outcome
//! - `pushsecret_remote_operations_total` - KMS and SSM calls by operation and outcome
//! - `pushsecret_remote_operation_duration_seconds` - Duration of KMS and SSM calls
//! - `pushsecret_cooldowns_total` - Cooldowns applied by operation
//! - `pushsecret_requeues_total` - Requeues by reason

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "pushsecret_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "pushsecret_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "pushsecret_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static SYNCS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new("pushsecret_syncs_total", "Publish attempts by outcome"),
        &["outcome"],
    )
    .expect("Failed to create SYNCS_TOTAL metric - this should never happen")
});

static PARAMETERS_PUBLISHED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "pushsecret_parameters_published_total",
        "Total number of parameters written to Parameter Store",
    )
    .expect("Failed to create PARAMETERS_PUBLISHED_TOTAL metric - this should never happen")
});

static DELETIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "pushsecret_deletions_total",
            "Parameter delete batches by path and outcome",
        ),
        &["path", "outcome"],
    )
    .expect("Failed to create DELETIONS_TOTAL metric - this should never happen")
});

static REMOTE_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "pushsecret_remote_operations_total",
            "Total number of KMS and SSM operations by operation and outcome",
        ),
        &["operation", "outcome"],
    )
    .expect("Failed to create REMOTE_OPERATIONS_TOTAL metric - this should never happen")
});

static REMOTE_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "pushsecret_remote_operation_duration_seconds",
            "Duration of KMS and SSM operations in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["operation"],
    )
    .expect("Failed to create REMOTE_OPERATION_DURATION metric - this should never happen")
});

static COOLDOWNS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "pushsecret_cooldowns_total",
            "Cooldowns applied before retrying a failed operation",
        ),
        &["operation"],
    )
    .expect("Failed to create COOLDOWNS_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new("pushsecret_requeues_total", "Requeues by reason"),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Fails only when a metric is registered twice"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(SYNCS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PARAMETERS_PUBLISHED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DELETIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REMOTE_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REMOTE_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(COOLDOWNS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

/// `outcome` is `success` or `error`
pub fn increment_syncs(outcome: &str) {
    SYNCS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn increment_parameters_published(count: usize) {
    PARAMETERS_PUBLISHED_TOTAL.inc_by(count as u64);
}

/// `path` is `authoritative` (finalizer) or `opportunistic` (update pre-check)
pub fn increment_deletions(path: &str, outcome: &str) {
    DELETIONS_TOTAL.with_label_values(&[path, outcome]).inc();
}

pub fn record_remote_operation(operation: &str, outcome: &str, duration: f64) {
    REMOTE_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    REMOTE_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_cooldowns(operation: &str) {
    COOLDOWNS_TOTAL.with_label_values(&[operation]).inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}
