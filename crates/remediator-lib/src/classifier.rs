//! Pod health classification
//!
//! Maps a [`PodObservation`] onto [`HealthClass`] using the pod phase and
//! the `Ready` / `ContainersReady` conditions. Classification is a pure
//! function of the observation.

use crate::models::{condition_types, ConditionStatus, HealthClass, PodObservation, PodPhase};

/// Classify an observation.
///
/// - `Failed` / `Unknown` phases are always failing; conditions are ignored.
/// - `Running` pods are degraded when a present `Ready` or `ContainersReady`
///   condition is not `True`. A missing condition carries no signal.
/// - `Pending` / `Succeeded` pods are out of remediation scope.
pub fn classify(observation: &PodObservation) -> HealthClass {
    match observation.phase() {
        PodPhase::Failed | PodPhase::Unknown => HealthClass::Failing,
        PodPhase::Running => {
            if not_ready_signals(observation).is_empty() {
                HealthClass::Healthy
            } else {
                HealthClass::Degraded
            }
        }
        PodPhase::Pending | PodPhase::Succeeded => HealthClass::Healthy,
    }
}

/// Human-readable descriptions of the readiness signals that are present and
/// not `True`. Empty for a ready pod.
pub fn not_ready_signals(observation: &PodObservation) -> Vec<&'static str> {
    let mut signals = Vec::new();

    if is_not_true(observation, condition_types::READY) {
        signals.push("pod is not ready");
    }
    if is_not_true(observation, condition_types::CONTAINERS_READY) {
        signals.push("containers in pod are not ready");
    }

    signals
}

fn is_not_true(observation: &PodObservation, condition_type: &str) -> bool {
    observation
        .conditions()
        .iter()
        .any(|c| c.condition_type == condition_type && c.status != ConditionStatus::True)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PodCondition, PodIdentity};

    fn observation(phase: PodPhase, conditions: Vec<(&str, ConditionStatus)>) -> PodObservation {
        PodObservation::new(
            PodIdentity::new("default", "api-7d9f"),
            phase,
            conditions
                .into_iter()
                .map(|(t, s)| PodCondition::new(t, s))
                .collect(),
        )
    }

    #[test]
    fn test_failed_and_unknown_are_failing() {
        let failed = observation(PodPhase::Failed, vec![]);
        assert_eq!(classify(&failed), HealthClass::Failing);

        // Conditions are not consulted for an unknown phase
        let unknown = observation(
            PodPhase::Unknown,
            vec![
                ("Ready", ConditionStatus::True),
                ("ContainersReady", ConditionStatus::True),
            ],
        );
        assert_eq!(classify(&unknown), HealthClass::Failing);
    }

    #[test]
    fn test_running_not_ready_is_degraded() {
        let obs = observation(
            PodPhase::Running,
            vec![
                ("Ready", ConditionStatus::False),
                ("ContainersReady", ConditionStatus::True),
            ],
        );
        assert_eq!(classify(&obs), HealthClass::Degraded);
        assert_eq!(not_ready_signals(&obs), vec!["pod is not ready"]);
    }

    #[test]
    fn test_running_unknown_condition_is_degraded() {
        let obs = observation(
            PodPhase::Running,
            vec![("ContainersReady", ConditionStatus::Unknown)],
        );
        assert_eq!(classify(&obs), HealthClass::Degraded);
    }

    #[test]
    fn test_running_missing_conditions_is_healthy() {
        let obs = observation(PodPhase::Running, vec![]);
        assert_eq!(classify(&obs), HealthClass::Healthy);

        let obs = observation(
            PodPhase::Running,
            vec![
                ("Ready", ConditionStatus::True),
                ("PodScheduled", ConditionStatus::False),
            ],
        );
        assert_eq!(classify(&obs), HealthClass::Healthy);
    }

    #[test]
    fn test_pending_and_succeeded_are_healthy() {
        let pending = observation(PodPhase::Pending, vec![("Ready", ConditionStatus::False)]);
        let succeeded = observation(PodPhase::Succeeded, vec![]);

        assert_eq!(classify(&pending), HealthClass::Healthy);
        assert_eq!(classify(&succeeded), HealthClass::Healthy);
    }

    #[test]
    fn test_condition_order_does_not_matter() {
        let a = observation(
            PodPhase::Running,
            vec![
                ("Ready", ConditionStatus::True),
                ("ContainersReady", ConditionStatus::False),
            ],
        );
        let b = observation(
            PodPhase::Running,
            vec![
                ("ContainersReady", ConditionStatus::False),
                ("Ready", ConditionStatus::True),
            ],
        );

        assert_eq!(classify(&a), classify(&b));
        assert_eq!(classify(&a), classify(&a));
    }
}
