//! Controller configuration

use anyhow::{Context, Result};
use remediator_lib::alert::{AlertDispatcher, AlertmanagerSink, SmtpAlertSink, SmtpSettings};
use remediator_lib::executor::{DEFAULT_API_TIMEOUT, DEFAULT_RESTART_GRACE};
use remediator_lib::{ControllerConfig, RemediationError, DEFAULT_MAX_RESTARTS};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Prefix of every configuration variable (`REMEDIATOR_WORKERS`, ...)
pub const ENV_PREFIX: &str = "REMEDIATOR";

/// Unprefixed variables still honoured, below their prefixed form
const LEGACY_VARIABLES: &[&str] = &["MAX_RESTARTS", "EMAIL_ALERTS"];

/// Controller configuration, read from `REMEDIATOR_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct RemediatorConfig {
    /// Restarts allowed before a pod is escalated
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,

    /// Send escalation mails
    #[serde(default)]
    pub email_alerts: bool,

    /// Wait between deleting and recreating a pod
    #[serde(default = "default_restart_grace")]
    pub restart_grace_secs: u64,

    /// Deadline for a single Kubernetes API call
    #[serde(default = "default_api_timeout")]
    pub api_timeout_secs: u64,

    /// Worker count; 1 processes observations strictly one at a time
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Restrict the watch to one namespace
    #[serde(default)]
    pub watch_namespace: Option<String>,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: Option<String>,

    #[serde(default)]
    pub smtp_password: Option<String>,

    #[serde(default = "default_alert_from")]
    pub alert_from: String,

    #[serde(default = "default_alert_to")]
    pub alert_to: String,

    /// Alertmanager base URL; alerts are also posted there when set
    #[serde(default)]
    pub alertmanager_url: Option<String>,

    /// Name of this controller instance in logs
    #[serde(default = "default_instance_name")]
    pub instance_name: String,
}

fn default_max_restarts() -> u32 {
    DEFAULT_MAX_RESTARTS
}

fn default_restart_grace() -> u64 {
    DEFAULT_RESTART_GRACE.as_secs()
}

fn default_api_timeout() -> u64 {
    DEFAULT_API_TIMEOUT.as_secs()
}

fn default_workers() -> usize {
    1
}

fn default_queue_capacity() -> usize {
    256
}

fn default_api_port() -> u16 {
    8080
}

fn default_smtp_host() -> String {
    "smtp.example.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_alert_from() -> String {
    "pod.monitoring@example.com".to_string()
}

fn default_alert_to() -> String {
    "alerting@example.com".to_string()
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "pod-remediator".to_string())
}

impl RemediatorConfig {
    /// Load configuration from the process environment.
    ///
    /// Unlike missing values, malformed values are an error: the controller
    /// refuses to start rather than run with a budget it was not given.
    pub fn load() -> Result<Self> {
        let legacy = LEGACY_VARIABLES
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|value| (*name, value)))
            .collect::<Vec<_>>();

        Self::from_sources(config::Environment::with_prefix(ENV_PREFIX), &legacy)
    }

    fn from_sources(env: config::Environment, legacy: &[(&str, String)]) -> Result<Self> {
        let mut builder = config::Config::builder();
        for (name, value) in legacy {
            builder = builder
                .set_default(name.to_lowercase(), value.as_str())
                .context("Failed to read configuration")?;
        }

        let config: Self = builder
            .add_source(env)
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), RemediationError> {
        if self.workers == 0 {
            return Err(RemediationError::Configuration(
                "REMEDIATOR_WORKERS must be at least 1".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(RemediationError::Configuration(
                "REMEDIATOR_QUEUE_CAPACITY must be at least 1".into(),
            ));
        }
        if self.api_timeout_secs == 0 {
            return Err(RemediationError::Configuration(
                "REMEDIATOR_API_TIMEOUT_SECS must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn restart_grace(&self) -> Duration {
        Duration::from_secs(self.restart_grace_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn controller(&self) -> ControllerConfig {
        ControllerConfig {
            workers: self.workers,
            queue_capacity: self.queue_capacity,
        }
    }

    pub fn smtp_settings(&self) -> SmtpSettings {
        SmtpSettings {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            from: self.alert_from.clone(),
            to: self.alert_to.clone(),
        }
    }

    /// Build the alert dispatcher with every configured sink
    pub fn alert_dispatcher(&self) -> Result<AlertDispatcher> {
        let mut dispatcher = AlertDispatcher::new(true).with_send_timeout(self.api_timeout());

        if self.email_alerts {
            let smtp = SmtpAlertSink::new(&self.smtp_settings())
                .context("Invalid SMTP alert configuration")?;
            dispatcher = dispatcher.with_sink(Arc::new(smtp));
        }

        if let Some(url) = &self.alertmanager_url {
            let alertmanager = AlertmanagerSink::new(url, self.api_timeout())
                .context("Invalid Alertmanager configuration")?;
            dispatcher = dispatcher.with_sink(Arc::new(alertmanager));
        }

        Ok(dispatcher)
    }
}
