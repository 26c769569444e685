//! Pod Remediator - restarts failing pods and escalates exhausted ones
//!
//! This binary watches pods, restarts the ones that fail, and once a pod
//! has used up its restart budget scales its deployment to zero and alerts.

use anyhow::{Context, Result};
use pod_remediator::{api, config::RemediatorConfig};
use remediator_lib::{
    executor::KubeClusterClient,
    health::{components, HealthRegistry},
    observability::{ControllerMetrics, StructuredLogger},
    source, Controller, InMemoryAttemptStore, RemediationEngine, RemediatorBuilder, RunOutcome,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const CONTROLLER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting pod-remediator");

    let config = RemediatorConfig::load()?;
    info!(
        instance = %config.instance_name,
        max_restarts = config.max_restarts,
        email_alerts = config.email_alerts,
        namespace = config.watch_namespace.as_deref().unwrap_or("<all>"),
        "Controller configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::WATCHER).await;
    health_registry.register(components::EXECUTOR).await;
    health_registry.register(components::ALERTER).await;

    let metrics = ControllerMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);

    // In-cluster service account first, local kubeconfig otherwise
    let client = kube::Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let cluster = Arc::new(KubeClusterClient::new(client.clone(), config.api_timeout()));

    let alerts = config.alert_dispatcher()?;
    if !alerts.is_enabled() {
        warn!("No alert sink configured, escalations will only be logged");
    }

    let engine = RemediationEngine::new(config.max_restarts, Arc::new(InMemoryAttemptStore::new()));
    let remediator = Arc::new(
        RemediatorBuilder::new()
            .engine(engine)
            .cluster(cluster)
            .restart_grace(config.restart_grace())
            .alerts(alerts)
            .health(health_registry.clone())
            .logger(logger.clone())
            .build()?,
    );

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics,
        remediator.clone(),
    ));
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let signal_logger = logger.clone();
    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        signal_logger.log_shutdown(&format!("{} received", signal));
        let _ = shutdown_tx.send(());
    });

    logger.log_startup(CONTROLLER_VERSION, config.max_restarts, config.workers);
    health_registry.set_ready(true).await;

    let controller = Controller::new(remediator, config.controller());
    let events = source::watch_pods(client, config.watch_namespace.as_deref());
    let outcome = controller.run(events, shutdown_rx).await;

    health_registry.set_ready(false).await;
    api_handle.abort();

    match outcome {
        RunOutcome::Shutdown => {
            info!("Shutdown complete");
            Ok(())
        }
        RunOutcome::StreamEnded => {
            logger.log_shutdown("pod watch stream ended");
            anyhow::bail!("Pod watch stream ended unexpectedly")
        }
    }
}

/// Resolve on SIGINT or SIGTERM, returning the signal name
async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
