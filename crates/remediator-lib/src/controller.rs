//! Remediation pipeline
//!
//! Implements the classify → decide → execute → alert sequence for a single
//! observation ([`Remediator`]) and the loop that feeds observations from the
//! watch stream to a pool of workers ([`Controller`]).
//!
//! Observations are sharded onto workers by pod identity, so every pod is
//! handled by exactly one worker: its observations are processed in arrival
//! order and two actions on the same pod never overlap. With a single worker
//! the whole pipeline is strictly serial, and a restart's grace wait stalls
//! every later observation.

use crate::alert::{Alert, AlertDispatcher};
use crate::classifier::{classify, not_ready_signals};
use crate::engine::RemediationEngine;
use crate::error::{RemediationError, Result};
use crate::executor::{
    ClusterClient, DeploymentResolver, NameSubstringResolver, RestartExecutor, ScaleDownExecutor,
    DEFAULT_RESTART_GRACE,
};
use crate::health::{components, HealthRegistry};
use crate::models::{AttemptEntry, HealthClass, PodIdentity, PodObservation, RemediationDecision};
use crate::observability::{actions, ControllerMetrics, StructuredLogger};
use std::collections::hash_map::DefaultHasher;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

/// Configuration for the worker pool
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Number of workers; 1 keeps the pipeline strictly serial
    pub workers: usize,
    /// Capacity of each worker's queue
    pub queue_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_capacity: 256,
        }
    }
}

/// Processes one observation end to end
pub struct Remediator {
    engine: RemediationEngine,
    restarter: RestartExecutor,
    scaler: ScaleDownExecutor,
    alerts: AlertDispatcher,
    health: HealthRegistry,
    metrics: ControllerMetrics,
    logger: StructuredLogger,
}

impl Remediator {
    /// Classify, decide and act on one observation.
    ///
    /// Action failures are logged and recorded on the health registry; they
    /// never abort processing. The attempt that failed still counts.
    pub async fn process(&self, observation: PodObservation) -> RemediationDecision {
        let identity = observation.identity();
        let class = classify(&observation);
        self.metrics.inc_observation(class);

        if class == HealthClass::Degraded {
            self.logger
                .log_degraded(identity, &not_ready_signals(&observation));
        }

        let decision = self.engine.decide(identity, class);
        if decision == RemediationDecision::None {
            return decision;
        }

        self.metrics.inc_decision(&decision);
        self.metrics
            .set_tracked_pods(self.engine.store().len() as i64);

        match decision {
            RemediationDecision::Restart(attempt) => {
                self.logger
                    .log_restart(identity, attempt, self.engine.max_restarts());
                self.restart(identity).await;
            }
            RemediationDecision::Escalate(attempt) => {
                self.logger.log_escalation(identity, attempt);
                self.scale_down(identity).await;

                let alert =
                    Alert::escalation(identity.clone(), attempt, self.engine.max_restarts());
                self.alert(&alert).await;
            }
            RemediationDecision::None => {}
        }

        decision
    }

    async fn restart(&self, identity: &PodIdentity) {
        let start = Instant::now();
        let result = self.restarter.restart(identity).await;
        self.record_action(identity, actions::RESTART, start, result)
            .await;
    }

    async fn scale_down(&self, identity: &PodIdentity) {
        let start = Instant::now();
        let result = self.scaler.scale_down(identity).await.map(|_| ());
        self.record_action(identity, actions::SCALE_DOWN, start, result)
            .await;
    }

    async fn record_action(
        &self,
        identity: &PodIdentity,
        action: &str,
        start: Instant,
        result: Result<()>,
    ) {
        let elapsed = start.elapsed().as_secs_f64();
        match result {
            Ok(()) => {
                self.metrics.observe_action(action, true, elapsed);
                self.health.set_healthy(components::EXECUTOR).await;
            }
            Err(e) => {
                self.metrics.observe_action(action, false, elapsed);
                self.logger
                    .log_action_failed(identity, action, &e.to_string());
                self.health
                    .set_degraded(
                        components::EXECUTOR,
                        format!("{} of {} failed: {}", action, identity, e),
                    )
                    .await;
            }
        }
    }

    async fn alert(&self, alert: &Alert) {
        let report = self.alerts.dispatch(alert).await;
        self.metrics.add_alerts(report.delivered, report.failed);

        if report.failed > 0 {
            self.health
                .set_degraded(
                    components::ALERTER,
                    format!("{} alert deliveries failed", report.failed),
                )
                .await;
        } else if report.delivered > 0 {
            self.health.set_healthy(components::ALERTER).await;
        }
    }

    /// Current attempt records, sorted by namespace and name
    pub fn attempts_snapshot(&self) -> Vec<AttemptEntry> {
        self.engine
            .store()
            .snapshot()
            .into_iter()
            .map(|(identity, attempts)| AttemptEntry {
                namespace: identity.namespace,
                pod_name: identity.name,
                attempts,
                escalated: self.engine.is_escalated(attempts),
            })
            .collect()
    }

    pub fn engine(&self) -> &RemediationEngine {
        &self.engine
    }
}

/// Builder for [`Remediator`]
pub struct RemediatorBuilder {
    engine: Option<RemediationEngine>,
    cluster: Option<Arc<dyn ClusterClient>>,
    restart_grace: Duration,
    resolver: Box<dyn DeploymentResolver>,
    alerts: AlertDispatcher,
    health: HealthRegistry,
    logger: StructuredLogger,
}

impl RemediatorBuilder {
    pub fn new() -> Self {
        Self {
            engine: None,
            cluster: None,
            restart_grace: DEFAULT_RESTART_GRACE,
            resolver: Box::new(NameSubstringResolver),
            alerts: AlertDispatcher::disabled(),
            health: HealthRegistry::new(),
            logger: StructuredLogger::new("pod-remediator"),
        }
    }

    pub fn engine(mut self, engine: RemediationEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn cluster(mut self, cluster: Arc<dyn ClusterClient>) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn restart_grace(mut self, grace: Duration) -> Self {
        self.restart_grace = grace;
        self
    }

    pub fn resolver(mut self, resolver: Box<dyn DeploymentResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn alerts(mut self, alerts: AlertDispatcher) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = health;
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn build(self) -> Result<Remediator> {
        let engine = self
            .engine
            .ok_or_else(|| RemediationError::Configuration("engine is required".into()))?;
        let cluster = self
            .cluster
            .ok_or_else(|| RemediationError::Configuration("cluster client is required".into()))?;

        Ok(Remediator {
            engine,
            restarter: RestartExecutor::new(cluster.clone(), self.restart_grace),
            scaler: ScaleDownExecutor::with_resolver(cluster, self.resolver),
            alerts: self.alerts,
            health: self.health,
            metrics: ControllerMetrics::new(),
            logger: self.logger,
        })
    }
}

impl Default for RemediatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Why [`Controller::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// A shutdown signal was received
    Shutdown,
    /// The watch stream ended
    StreamEnded,
}

/// Worker index for a pod; stable for the lifetime of the process
pub fn shard_for(identity: &PodIdentity, workers: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    identity.hash(&mut hasher);
    (hasher.finish() % workers.max(1) as u64) as usize
}

/// Feeds the watch stream into the worker pool
pub struct Controller {
    remediator: Arc<Remediator>,
    config: ControllerConfig,
    health: HealthRegistry,
    metrics: ControllerMetrics,
    logger: StructuredLogger,
}

impl Controller {
    pub fn new(remediator: Arc<Remediator>, config: ControllerConfig) -> Self {
        Self {
            health: remediator.health.clone(),
            logger: remediator.logger.clone(),
            metrics: ControllerMetrics::new(),
            remediator,
            config,
        }
    }

    /// Consume observations until shutdown or until the stream ends.
    ///
    /// Observations already queued when the loop stops are still processed
    /// before this returns.
    pub async fn run<S, E>(&self, events: S, mut shutdown: broadcast::Receiver<()>) -> RunOutcome
    where
        S: Stream<Item = std::result::Result<PodObservation, E>> + Send,
        E: Display,
    {
        let workers = self.config.workers.max(1);
        info!(
            workers = workers,
            queue_capacity = self.config.queue_capacity,
            "Starting remediation loop"
        );

        let mut senders = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
            senders.push(tx);
            handles.push(tokio::spawn(Self::worker(
                worker_id,
                self.remediator.clone(),
                rx,
            )));
        }

        tokio::pin!(events);
        let mut watch_degraded = false;

        let outcome = loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("Shutting down remediation loop");
                    break RunOutcome::Shutdown;
                }
                next = events.next() => next,
            };

            match next {
                Some(Ok(observation)) => {
                    if watch_degraded {
                        self.health.set_healthy(components::WATCHER).await;
                        watch_degraded = false;
                    }
                    let shard = shard_for(observation.identity(), workers);

                    // A full queue must not hide a shutdown request
                    tokio::select! {
                        biased;
                        _ = shutdown.recv() => {
                            info!(worker = shard, "Shutting down remediation loop");
                            break RunOutcome::Shutdown;
                        }
                        sent = senders[shard].send(observation) => {
                            if sent.is_err() {
                                warn!(worker = shard, "Worker stopped unexpectedly");
                                break RunOutcome::Shutdown;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    self.metrics.inc_watch_errors();
                    self.logger.log_watch_error(&e.to_string());
                    self.health
                        .set_degraded(components::WATCHER, e.to_string())
                        .await;
                    watch_degraded = true;
                }
                None => {
                    warn!("Pod watch stream ended");
                    self.health
                        .set_unhealthy(components::WATCHER, "watch stream ended")
                        .await;
                    break RunOutcome::StreamEnded;
                }
            }
        };

        drop(senders);
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Worker task failed");
            }
        }

        outcome
    }

    async fn worker(
        worker_id: usize,
        remediator: Arc<Remediator>,
        mut rx: mpsc::Receiver<PodObservation>,
    ) {
        while let Some(observation) = rx.recv().await {
            let decision = remediator.process(observation).await;
            if decision != RemediationDecision::None {
                debug!(worker = worker_id, decision = ?decision, "Observation handled");
            }
        }
        debug!(worker = worker_id, "Worker drained");
    }
}
