//! Alertmanager webhook alerts

use super::{Alert, AlertSink};
use crate::error::{RemediationError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Alertmanager v2 alert format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertmanagerAlert {
    /// Alert labels for routing and grouping
    pub labels: HashMap<String, String>,
    /// Alert annotations with details
    pub annotations: HashMap<String, String>,
    /// Start time in RFC3339 format
    pub starts_at: String,
    /// End time (empty for firing alerts)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<String>,
    #[serde(rename = "generatorURL", skip_serializing_if = "Option::is_none")]
    pub generator_url: Option<String>,
}

impl AlertmanagerAlert {
    pub fn from_alert(alert: &Alert) -> Self {
        let mut labels = HashMap::new();
        labels.insert("alertname".to_string(), "PodRemediationExhausted".to_string());
        labels.insert("severity".to_string(), "critical".to_string());
        labels.insert("namespace".to_string(), alert.identity.namespace.clone());
        labels.insert("pod".to_string(), alert.identity.name.clone());

        let mut annotations = HashMap::new();
        annotations.insert(
            "summary".to_string(),
            format!(
                "Pod {}/{} is failing after repeated restarts",
                alert.identity.namespace, alert.identity.name
            ),
        );
        annotations.insert("description".to_string(), alert.reason.clone());
        annotations.insert("attempts".to_string(), alert.attempts.to_string());

        Self {
            labels,
            annotations,
            starts_at: alert.timestamp.clone(),
            ends_at: None,
            generator_url: None,
        }
    }
}

/// Posts escalation alerts to an Alertmanager instance
pub struct AlertmanagerSink {
    client: reqwest::Client,
    endpoint: String,
}

impl AlertmanagerSink {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemediationError::Configuration(format!("alertmanager client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/v2/alerts", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AlertSink for AlertmanagerSink {
    fn name(&self) -> &'static str {
        "alertmanager"
    }

    async fn send(&self, alert: &Alert) -> Result<()> {
        let payload = vec![AlertmanagerAlert::from_alert(alert)];

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RemediationError::AlertDelivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemediationError::AlertDelivery(format!(
                "alertmanager returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}
