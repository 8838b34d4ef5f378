//! # PushEncryptedSecret Controller
//!
//! A Kubernetes controller that publishes KMS-encrypted values to AWS Systems
//! Manager Parameter Store.
//!
//! ## Overview
//!
//! For every `PushEncryptedSecret` resource the controller:
//!
//! 1. **Guards the resource** with a finalizer before writing anything
//! 2. **Decrypts each entry** with AWS KMS
//! 3. **Writes a `SecureString` parameter** per entry, overwriting existing values
//! 4. **Deletes parameters** for keys removed by an update, and for every key
//!    when the resource is deleted
//! 5. **Records the outcome** in the resource status
//!
//! ## Configuration
//!
//! `KMS_KEY_ID` is required. See `config` for the optional variables.

use anyhow::Result;
use clap::Parser;
use pushsecret_controller::observability;
use pushsecret_controller::runtime::{initialize, run_watch_loop, RuntimeOverrides};
use tracing::info;

/// Command line flags; environment variables cover everything else
#[derive(Debug, Parser)]
#[command(name = "pushsecret-controller", version, about)]
struct Args {
    /// Port for /metrics, /healthz and /readyz (overrides METRICS_PORT)
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Log level for the controller target (overrides LOG_LEVEL; RUST_LOG still wins)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let init = initialize(RuntimeOverrides {
        metrics_port: args.metrics_port,
        log_level: args.log_level,
    })
    .await?;

    run_watch_loop(
        init.bundles,
        init.reconciler,
        init.server_state,
        init.controller_config,
    )
    .await?;

    info!("Controller stopped");
    observability::otel::shutdown_otel(init.otel_tracer_provider);

    Ok(())
}
