//! # Initialization
//!
//! Controller initialization logic including rustls setup, OpenTelemetry,
//! tracing, metrics, server startup, and Kubernetes and AWS client setup.

use crate::config::{load_config, ControllerConfig, ServerConfig};
use crate::constants::DEFAULT_LOG_FILTER;
use crate::controller::reconciler::{KubeBundleStore, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::crd::PushEncryptedSecret;
use crate::observability;
use crate::provider::aws::{load_sdk_config, AwsKms, AwsParameterStore};
use crate::provider::SecretGateway;
use anyhow::{Context, Result};
use kube::{api::Api, api::ListParams, Client};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Command line overrides applied on top of the environment
#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    pub metrics_port: Option<u16>,
    pub log_level: Option<String>,
}

/// Initialization result containing all necessary components for the controller
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// API for PushEncryptedSecret across all namespaces
    pub bundles: Api<PushEncryptedSecret>,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
    /// OpenTelemetry tracer provider (if initialized)
    pub otel_tracer_provider: Option<observability::otel::TracerProviderHandle>,
    /// Controller configuration
    pub controller_config: ControllerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.ready())
            .field("controller_config", &self.controller_config)
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Configuration loading (a missing `KMS_KEY_ID` is fatal)
/// - OpenTelemetry and tracing subscriber setup
/// - Metrics registration
/// - HTTP server startup
/// - Kubernetes client creation
/// - AWS client creation and reconciler setup
pub async fn initialize(overrides: RuntimeOverrides) -> Result<InitializationResult> {
    // Required for rustls 0.23+ when no default provider is set via features
    rustls::crypto::ring::default_provider()
        .install_default()
        .unwrap_or_else(|_| panic!("Failed to install rustls crypto provider"));

    // Loaded before tracing so the configured log level applies; the error
    // is reported once the subscriber is up
    let loaded = load_config();
    let log_level = overrides.log_level.clone().or_else(|| {
        loaded
            .as_ref()
            .ok()
            .map(|(controller, _)| controller.log_level.clone())
    });

    let otel_tracer_provider =
        observability::otel::init_otel().context("Failed to initialize OpenTelemetry")?;
    init_tracing(log_level.as_deref(), otel_tracer_provider.is_some());

    info!("Starting PushEncryptedSecret controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    let (controller_config, mut server_config) = match loaded {
        Ok(configs) => configs,
        Err(e) => {
            error!("Invalid controller configuration: {}", e);
            return Err(e).context("Failed to load controller configuration");
        }
    };
    if let Some(port) = overrides.metrics_port {
        server_config.metrics_port = port;
    }
    info!(
        kms_key_id = controller_config.kms_key_id.as_str(),
        region = controller_config.aws_region.as_deref().unwrap_or("sdk-default"),
        cooldown_policy = controller_config.cooldown_policy.name(),
        missing_key_policy = ?controller_config.missing_key_policy,
        "configuration loaded"
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::new());

    // Start HTTP server for metrics and probes, then wait until it is bound
    let server_state_clone = Arc::clone(&server_state);
    let server_port = server_config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    // Watch all namespaces
    let bundles: Api<PushEncryptedSecret> = Api::all(client.clone());
    check_crd_queryable(&bundles).await;

    let reconciler = Arc::new(build_reconciler(client.clone(), &controller_config).await);

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        bundles,
        reconciler,
        server_state,
        otel_tracer_provider,
        controller_config,
    })
}

fn init_tracing(log_level: Option<&str>, otel_enabled: bool) {
    let default_filter = log_level.map_or_else(
        || DEFAULT_LOG_FILTER.to_string(),
        |level| format!("pushsecret_controller={level}"),
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        // datadog-opentelemetry may already have installed a subscriber
        if otel_enabled {
            warn!("Tracing subscriber init returned error (may already be initialized by Datadog): {}", e);
        } else {
            eprintln!("Failed to initialize tracing subscriber: {e}");
        }
    }
}

/// Build the AWS clients once and hand them to the reconciler
async fn build_reconciler(client: Client, config: &ControllerConfig) -> Reconciler {
    let sdk_config = load_sdk_config(config.aws_region.as_deref()).await;
    let kms = Arc::new(AwsKms::new(&sdk_config, config.kms_endpoint_url.as_deref()));
    let parameter_store = Arc::new(AwsParameterStore::new(
        &sdk_config,
        config.ssm_endpoint_url.as_deref(),
    ));
    let gateway = SecretGateway::new(
        kms,
        parameter_store,
        config.kms_key_id.clone(),
        config.missing_key_policy,
    );

    Reconciler::new(
        Arc::new(KubeBundleStore::new(client)),
        gateway,
        config.cooldown_policy,
    )
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = server_config.startup_timeout();
    let poll_interval = server_config.poll_interval();
    let start_time = std::time::Instant::now();

    loop {
        // Check if server task crashed
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.ready() {
            info!("HTTP server is ready and accepting connections");
            break;
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }

    Ok(())
}

/// Log whether the CRD answers before the watch starts
///
/// Not fatal: the watch loop retries and reports 404s itself.
async fn check_crd_queryable(bundles: &Api<PushEncryptedSecret>) {
    match bundles.list(&ListParams::default().limit(1)).await {
        Ok(list) => {
            info!(
                existing = list.items.len(),
                "CRD is queryable, existing resources are reconciled by the initial watch"
            );
        }
        Err(e) => {
            error!("CRD is not queryable; {:?}. Is the CRD installed?", e);
            error!("Installation: cargo run --bin crdgen | kubectl apply -f -");
            warn!("Continuing despite CRD queryability check failure - controller will retry");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_build_info_is_stamped() {
        let timestamp: u64 = env!("BUILD_TIMESTAMP").parse().unwrap();
        assert!(timestamp > 0);
        assert!(!env!("BUILD_DATETIME").is_empty());
        assert!(!env!("BUILD_GIT_HASH").is_empty());
    }
}
