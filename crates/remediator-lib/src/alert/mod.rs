//! Escalation alerts
//!
//! Handles:
//! - The [`AlertSink`] boundary to outbound notification transports
//! - SMTP mail and Alertmanager webhook sinks
//! - Best-effort dispatch: delivery failures are logged, never returned

mod alertmanager;
mod smtp;

pub use alertmanager::{AlertmanagerAlert, AlertmanagerSink};
pub use smtp::{SmtpAlertSink, SmtpSettings};

use crate::error::{RemediationError, Result};
use crate::models::PodIdentity;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Subject line used for escalation mails
pub const ALERT_SUBJECT: &str = "Kubernetes Pod Failure Alert";

/// Default deadline for a single sink delivery
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// A pod whose restart budget is exhausted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub identity: PodIdentity,
    pub reason: String,
    pub attempts: u32,
    /// RFC3339 time the escalation was decided
    pub timestamp: String,
}

impl Alert {
    pub fn escalation(identity: PodIdentity, attempts: u32, max_restarts: u32) -> Self {
        Self {
            reason: format!(
                "pod failed after maximum restart attempts ({} of {})",
                attempts, max_restarts
            ),
            identity,
            attempts,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn subject(&self) -> &'static str {
        ALERT_SUBJECT
    }

    pub fn body(&self) -> String {
        format!(
            "Alert: Pod {} in namespace {} is failing.\n\nReason: {}\nAttempts: {}\nTime: {}",
            self.identity.name, self.identity.namespace, self.reason, self.attempts, self.timestamp
        )
    }
}

/// An outbound notification transport
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Short name for logs and metrics
    fn name(&self) -> &'static str;

    async fn send(&self, alert: &Alert) -> Result<()>;
}

/// Result of one dispatch, per sink
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Fans an alert out to every configured sink.
///
/// Dispatch never fails: each sink is attempted independently with its own
/// deadline and failures are logged.
#[derive(Clone)]
pub struct AlertDispatcher {
    enabled: bool,
    sinks: Vec<Arc<dyn AlertSink>>,
    send_timeout: Duration,
}

impl AlertDispatcher {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            sinks: Vec::new(),
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Dispatcher that never sends anything
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn with_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.sinks.is_empty()
    }

    pub async fn dispatch(&self, alert: &Alert) -> DispatchReport {
        let mut report = DispatchReport::default();

        if !self.is_enabled() {
            debug!(pod = %alert.identity, "Alerting disabled, not sending escalation alert");
            return report;
        }

        for sink in &self.sinks {
            match self.send_one(sink.as_ref(), alert).await {
                Ok(()) => {
                    report.delivered += 1;
                    info!(
                        pod = %alert.identity,
                        sink = sink.name(),
                        "Sent alert for failing pod"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        pod = %alert.identity,
                        sink = sink.name(),
                        error = %e,
                        "Failed to send alert"
                    );
                }
            }
        }

        report
    }

    async fn send_one(&self, sink: &dyn AlertSink, alert: &Alert) -> Result<()> {
        match tokio::time::timeout(self.send_timeout, sink.send(alert)).await {
            Ok(result) => result,
            Err(_) => Err(RemediationError::AlertDelivery(format!(
                "{} timed out after {}s",
                sink.name(),
                self.send_timeout.as_secs()
            ))),
        }
    }
}
