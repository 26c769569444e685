//! Observability infrastructure for the remediation controller
//!
//! Provides:
//! - Prometheus metrics (observations, decisions, action outcomes and latency)
//! - Structured JSON logging with tracing

use crate::models::{HealthClass, PodIdentity, RemediationDecision};
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Histogram buckets for action latency (in seconds); restarts include the
/// termination grace wait
const ACTION_LATENCY_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 7.5, 10.0, 30.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ControllerMetricsInner> = OnceLock::new();

struct ControllerMetricsInner {
    observations: IntCounterVec,
    decisions: IntCounterVec,
    actions: IntCounterVec,
    action_duration_seconds: HistogramVec,
    alerts: IntCounterVec,
    tracked_pods: IntGauge,
    watch_errors: IntCounter,
}

impl ControllerMetricsInner {
    fn new() -> Self {
        Self {
            observations: register_int_counter_vec!(
                "pod_remediator_observations_total",
                "Pod observations processed, by health classification",
                &["class"]
            )
            .expect("Failed to register observations_total"),

            decisions: register_int_counter_vec!(
                "pod_remediator_decisions_total",
                "Remediation decisions taken, by kind",
                &["decision"]
            )
            .expect("Failed to register decisions_total"),

            actions: register_int_counter_vec!(
                "pod_remediator_actions_total",
                "Remediation actions executed, by action and outcome",
                &["action", "outcome"]
            )
            .expect("Failed to register actions_total"),

            action_duration_seconds: register_histogram_vec!(
                "pod_remediator_action_duration_seconds",
                "Time spent executing a remediation action",
                &["action"],
                ACTION_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register action_duration_seconds"),

            alerts: register_int_counter_vec!(
                "pod_remediator_alerts_total",
                "Escalation alert deliveries, by outcome",
                &["outcome"]
            )
            .expect("Failed to register alerts_total"),

            tracked_pods: register_int_gauge!(
                "pod_remediator_tracked_pods",
                "Number of pods with a restart attempt record"
            )
            .expect("Failed to register tracked_pods"),

            watch_errors: register_int_counter!(
                "pod_remediator_watch_errors_total",
                "Errors reported by the pod watch stream"
            )
            .expect("Failed to register watch_errors_total"),
        }
    }
}

/// Remediation action label values
pub mod actions {
    pub const RESTART: &str = "restart";
    pub const SCALE_DOWN: &str = "scale_down";
}

/// Lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ControllerMetrics {
    _private: (),
}

impl Default for ControllerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ControllerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ControllerMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn inc_observation(&self, class: HealthClass) {
        self.inner()
            .observations
            .with_label_values(&[class.as_str()])
            .inc();
    }

    pub fn inc_decision(&self, decision: &RemediationDecision) {
        self.inner()
            .decisions
            .with_label_values(&[decision.as_str()])
            .inc();
    }

    /// Record the outcome and latency of one action
    pub fn observe_action(&self, action: &str, success: bool, duration_secs: f64) {
        let outcome = if success { "success" } else { "failure" };
        self.inner()
            .actions
            .with_label_values(&[action, outcome])
            .inc();
        self.inner()
            .action_duration_seconds
            .with_label_values(&[action])
            .observe(duration_secs);
    }

    pub fn add_alerts(&self, delivered: usize, failed: usize) {
        let alerts = &self.inner().alerts;
        alerts
            .with_label_values(&["delivered"])
            .inc_by(delivered as u64);
        alerts.with_label_values(&["failed"]).inc_by(failed as u64);
    }

    pub fn set_tracked_pods(&self, count: i64) {
        self.inner().tracked_pods.set(count);
    }

    pub fn inc_watch_errors(&self) {
        self.inner().watch_errors.inc();
    }

    /// Current value of the actions counter (for tests and diagnostics)
    pub fn action_count(&self, action: &str, success: bool) -> u64 {
        let outcome = if success { "success" } else { "failure" };
        self.inner()
            .actions
            .with_label_values(&[action, outcome])
            .get()
    }
}

/// Structured logger for controller events
///
/// Emits event-typed JSON records for decisions, actions and escalations.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, max_restarts: u32, workers: usize) {
        info!(
            event = "controller_started",
            instance = %self.instance,
            version = %version,
            max_restarts = max_restarts,
            workers = workers,
            "Pod remediation controller started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "controller_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Pod remediation controller shutting down"
        );
    }

    /// A running pod whose readiness signals are not all true
    pub fn log_degraded(&self, pod: &PodIdentity, signals: &[&str]) {
        for signal in signals {
            warn!(
                event = "pod_degraded",
                instance = %self.instance,
                namespace = %pod.namespace,
                pod_name = %pod.name,
                signal = %signal,
                "Pod {}: {}",
                pod.name,
                signal
            );
        }
    }

    pub fn log_restart(&self, pod: &PodIdentity, attempt: u32, max_restarts: u32) {
        info!(
            event = "pod_restarting",
            instance = %self.instance,
            namespace = %pod.namespace,
            pod_name = %pod.name,
            attempt = attempt,
            max_restarts = max_restarts,
            "Restarting pod"
        );
    }

    pub fn log_escalation(&self, pod: &PodIdentity, attempt: u32) {
        error!(
            event = "pod_escalated",
            instance = %self.instance,
            namespace = %pod.namespace,
            pod_name = %pod.name,
            attempt = attempt,
            "Pod failed after maximum restart attempts, scaling down deployment"
        );
    }

    pub fn log_action_failed(&self, pod: &PodIdentity, action: &str, error: &str) {
        error!(
            event = "remediation_failed",
            instance = %self.instance,
            namespace = %pod.namespace,
            pod_name = %pod.name,
            action = %action,
            error = %error,
            "Remediation action failed"
        );
    }

    pub fn log_watch_error(&self, error: &str) {
        warn!(
            event = "watch_error",
            instance = %self.instance,
            error = %error,
            "Pod watch stream reported an error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_metrics_creation() {
        let metrics = ControllerMetrics::new();

        metrics.inc_observation(HealthClass::Failing);
        metrics.inc_decision(&RemediationDecision::Restart(1));
        metrics.add_alerts(1, 0);
        metrics.set_tracked_pods(3);
        metrics.inc_watch_errors();

        let before = metrics.action_count(actions::SCALE_DOWN, false);
        metrics.observe_action(actions::SCALE_DOWN, false, 0.2);
        // Other tests share the global registry, so only a lower bound holds
        assert!(metrics.action_count(actions::SCALE_DOWN, false) > before);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("remediator-0");
        assert_eq!(logger.instance, "remediator-0");
    }
}
