//! Core data models for the remediation controller

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a pod: `(namespace, name)`
///
/// A pod that is deleted and recreated under the same name keeps its identity,
/// so its attempt count carries over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PodIdentity {
    pub namespace: String,
    pub name: String,
}

impl PodIdentity {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Coarse lifecycle phase of a pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    /// Parse a phase as reported by the API server
    pub fn parse(phase: &str) -> Option<Self> {
        match phase {
            "Pending" => Some(PodPhase::Pending),
            "Running" => Some(PodPhase::Running),
            "Succeeded" => Some(PodPhase::Succeeded),
            "Failed" => Some(PodPhase::Failed),
            "Unknown" => Some(PodPhase::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Status value of a pod condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "True" => ConditionStatus::True,
            "False" => ConditionStatus::False,
            _ => ConditionStatus::Unknown,
        }
    }
}

/// Well-known condition types consulted by the classifier
pub mod condition_types {
    pub const READY: &str = "Ready";
    pub const CONTAINERS_READY: &str = "ContainersReady";
}

/// A named readiness signal attached to a pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodCondition {
    pub condition_type: String,
    pub status: ConditionStatus,
}

impl PodCondition {
    pub fn new(condition_type: impl Into<String>, status: ConditionStatus) -> Self {
        Self {
            condition_type: condition_type.into(),
            status,
        }
    }
}

/// Point-in-time snapshot of a pod, derived from a watch event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodObservation {
    identity: PodIdentity,
    phase: PodPhase,
    conditions: Vec<PodCondition>,
}

impl PodObservation {
    pub fn new(identity: PodIdentity, phase: PodPhase, conditions: Vec<PodCondition>) -> Self {
        Self {
            identity,
            phase,
            conditions,
        }
    }

    pub fn identity(&self) -> &PodIdentity {
        &self.identity
    }

    pub fn phase(&self) -> PodPhase {
        self.phase
    }

    pub fn conditions(&self) -> &[PodCondition] {
        &self.conditions
    }

    /// Status of the first condition with the given type, if present
    pub fn condition(&self, condition_type: &str) -> Option<ConditionStatus> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
            .map(|c| c.status)
    }
}

/// Health classification of a single observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthClass {
    Healthy,
    Degraded,
    Failing,
}

impl HealthClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthClass::Healthy => "healthy",
            HealthClass::Degraded => "degraded",
            HealthClass::Failing => "failing",
        }
    }
}

/// Outcome of the remediation engine for one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "attempt", rename_all = "snake_case")]
pub enum RemediationDecision {
    /// Nothing to do
    None,
    /// Restart the pod; carries the attempt number
    Restart(u32),
    /// Restart budget exhausted; carries the attempt number that crossed it
    Escalate(u32),
}

impl RemediationDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemediationDecision::None => "none",
            RemediationDecision::Restart(_) => "restart",
            RemediationDecision::Escalate(_) => "escalate",
        }
    }

    pub fn attempt(&self) -> Option<u32> {
        match self {
            RemediationDecision::None => None,
            RemediationDecision::Restart(n) | RemediationDecision::Escalate(n) => Some(*n),
        }
    }
}

/// Snapshot row of the attempt tracker, served by the `/attempts` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptEntry {
    pub namespace: String,
    pub pod_name: String,
    pub attempts: u32,
    pub escalated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_parse() {
        assert_eq!(PodPhase::parse("Running"), Some(PodPhase::Running));
        assert_eq!(PodPhase::parse("Unknown"), Some(PodPhase::Unknown));
        assert_eq!(PodPhase::parse("Evicted"), None);
    }

    #[test]
    fn test_condition_status_parse() {
        assert_eq!(ConditionStatus::parse("True"), ConditionStatus::True);
        assert_eq!(ConditionStatus::parse("False"), ConditionStatus::False);
        assert_eq!(ConditionStatus::parse("true"), ConditionStatus::Unknown);
    }

    #[test]
    fn test_observation_condition_lookup() {
        let obs = PodObservation::new(
            PodIdentity::new("default", "web-1"),
            PodPhase::Running,
            vec![
                PodCondition::new(condition_types::READY, ConditionStatus::False),
                PodCondition::new(condition_types::CONTAINERS_READY, ConditionStatus::True),
            ],
        );

        assert_eq!(obs.condition("Ready"), Some(ConditionStatus::False));
        assert_eq!(obs.condition("PodScheduled"), None);
        assert_eq!(obs.identity().to_string(), "default/web-1");
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_string(&RemediationDecision::Restart(2)).unwrap();
        assert_eq!(json, r#"{"action":"restart","attempt":2}"#);
        assert_eq!(RemediationDecision::Escalate(4).attempt(), Some(4));
        assert_eq!(RemediationDecision::None.attempt(), None);
    }
}
