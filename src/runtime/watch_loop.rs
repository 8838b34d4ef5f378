//! # Watch Loop
//!
//! Controller watch loop that monitors PushEncryptedSecret resources and
//! triggers reconciliation when changes are detected.

use crate::config::ControllerConfig;
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::PushEncryptedSecret;
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use crate::runtime::update_watch::run_update_watch;
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{watcher, Controller};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run the controller watch loop
///
/// Sets up the kube-runtime controller over all namespaces, plus the update
/// watch that prunes removed keys. Handles graceful shutdown and restarts
/// the controller when its stream ends.
///
/// # Errors
///
/// Currently always returns `Ok` once shutdown completes.
pub async fn run_watch_loop(
    bundles: Api<PushEncryptedSecret>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    controller_config: ControllerConfig,
) -> Result<(), anyhow::Error> {
    info!("Starting controller watch loop...");

    let backoff_start_ms = controller_config.backoff_start_ms;
    let max_backoff_ms = controller_config.backoff_max_ms;
    let watch_restart_delay = controller_config.watch_restart_delay_duration();
    let restart_delay_after_end = controller_config.watch_restart_delay_after_end_duration();

    let backoff_duration_ms = Arc::new(AtomicU64::new(backoff_start_ms));

    // Mark the server not ready on SIGTERM/SIGINT
    let shutdown_server_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
        shutdown_server_state.set_ready(false);
        info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
    });

    let update_watch = tokio::spawn(run_update_watch(bundles.clone(), Arc::clone(&reconciler)));

    loop {
        if !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let backoff_clone = Arc::clone(&backoff_duration_ms);
        let watch_span = tracing::span!(
            tracing::Level::INFO,
            "controller.watch",
            operation = "watch_loop"
        );
        let _watch_guard = watch_span.enter();

        let controller_future = Controller::new(bundles.clone(), watcher::Config::default().any_semantic())
            .shutdown_on_signal()
            .run(reconcile, handle_reconciliation_error, Arc::clone(&reconciler))
            .filter_map(move |x| {
                let backoff = Arc::clone(&backoff_clone);
                async move {
                    match &x {
                        Ok((obj, _action)) => {
                            backoff.store(backoff_start_ms, Ordering::Relaxed);
                            debug!(
                                resource.name = obj.name.as_str(),
                                resource.namespace = obj.namespace.as_deref().unwrap_or("default"),
                                "watch.event.reconciled"
                            );
                            Some(x)
                        }
                        Err(e) => {
                            let error_string = format!("{e:?}");
                            handle_watch_stream_error(
                                &error_string,
                                &backoff,
                                max_backoff_ms,
                                watch_restart_delay,
                            )
                            .await
                            .map(|()| x)
                        }
                    }
                }
            })
            .for_each(|_| futures::future::ready(()));

        controller_future.await;

        if !server_state.ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            restart_delay_after_end.as_secs()
        );
        tokio::time::sleep(restart_delay_after_end).await;
    }

    update_watch.abort();
    info!("Controller stopped gracefully");
    Ok(())
}
