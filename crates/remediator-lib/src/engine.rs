//! Remediation decision engine
//!
//! The state machine behind the controller. Every failing observation
//! advances the pod's attempt count; the count decides between another
//! restart and escalation. Nothing else moves the count, so a pod that
//! recovers keeps its previous count and escalated pods escalate again on
//! every further failure.

use crate::models::{HealthClass, PodIdentity, RemediationDecision};
use crate::tracker::AttemptStore;
use std::sync::Arc;

/// Default restart budget before escalation
pub const DEFAULT_MAX_RESTARTS: u32 = 3;

pub struct RemediationEngine {
    max_restarts: u32,
    attempts: Arc<dyn AttemptStore>,
}

impl RemediationEngine {
    pub fn new(max_restarts: u32, attempts: Arc<dyn AttemptStore>) -> Self {
        Self {
            max_restarts,
            attempts,
        }
    }

    pub fn max_restarts(&self) -> u32 {
        self.max_restarts
    }

    /// Decide what to do about one classified observation.
    ///
    /// Only `Failing` touches the attempt store.
    pub fn decide(&self, identity: &PodIdentity, class: HealthClass) -> RemediationDecision {
        if class != HealthClass::Failing {
            return RemediationDecision::None;
        }

        let attempt = self.attempts.increment(identity);
        if attempt <= self.max_restarts {
            RemediationDecision::Restart(attempt)
        } else {
            RemediationDecision::Escalate(attempt)
        }
    }

    /// Current attempt count for a pod
    pub fn attempts(&self, identity: &PodIdentity) -> u32 {
        self.attempts.get(identity)
    }

    /// Whether a count is past the restart budget
    pub fn is_escalated(&self, attempts: u32) -> bool {
        attempts > self.max_restarts
    }

    pub fn store(&self) -> &Arc<dyn AttemptStore> {
        &self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::InMemoryAttemptStore;

    fn engine(max_restarts: u32) -> RemediationEngine {
        RemediationEngine::new(max_restarts, Arc::new(InMemoryAttemptStore::new()))
    }

    #[test]
    fn test_escalation_sequence() {
        let engine = engine(3);
        let pod = PodIdentity::new("default", "worker-0");

        let decisions: Vec<_> = (0..5)
            .map(|_| engine.decide(&pod, HealthClass::Failing))
            .collect();

        assert_eq!(
            decisions,
            vec![
                RemediationDecision::Restart(1),
                RemediationDecision::Restart(2),
                RemediationDecision::Restart(3),
                RemediationDecision::Escalate(4),
                RemediationDecision::Escalate(5),
            ]
        );
        assert_eq!(engine.attempts(&pod), 5);
    }

    #[test]
    fn test_count_equals_consecutive_failures() {
        let engine = engine(2);
        let pod = PodIdentity::new("default", "worker-0");

        for n in 1..=10 {
            let decision = engine.decide(&pod, HealthClass::Failing);
            assert_eq!(engine.attempts(&pod), n);
            if n <= 2 {
                assert_eq!(decision, RemediationDecision::Restart(n));
            } else {
                assert_eq!(decision, RemediationDecision::Escalate(n));
            }
        }
    }

    #[test]
    fn test_non_failing_never_mutates() {
        let engine = engine(3);
        let pod = PodIdentity::new("default", "worker-0");

        assert_eq!(
            engine.decide(&pod, HealthClass::Healthy),
            RemediationDecision::None
        );
        assert_eq!(
            engine.decide(&pod, HealthClass::Degraded),
            RemediationDecision::None
        );
        assert!(engine.store().is_empty());

        engine.decide(&pod, HealthClass::Failing);
        engine.decide(&pod, HealthClass::Healthy);
        engine.decide(&pod, HealthClass::Degraded);
        assert_eq!(engine.attempts(&pod), 1);
    }

    #[test]
    fn test_recovery_does_not_reset() {
        let engine = engine(3);
        let pod = PodIdentity::new("default", "worker-0");

        engine.decide(&pod, HealthClass::Failing);
        engine.decide(&pod, HealthClass::Failing);
        engine.decide(&pod, HealthClass::Healthy);

        assert_eq!(
            engine.decide(&pod, HealthClass::Failing),
            RemediationDecision::Restart(3)
        );
    }

    #[test]
    fn test_zero_budget_escalates_immediately() {
        let engine = engine(0);
        let pod = PodIdentity::new("default", "worker-0");

        assert_eq!(
            engine.decide(&pod, HealthClass::Failing),
            RemediationDecision::Escalate(1)
        );
    }

    #[test]
    fn test_identities_are_independent() {
        let engine = engine(1);
        let a = PodIdentity::new("default", "a");
        let b = PodIdentity::new("default", "b");

        assert_eq!(
            engine.decide(&a, HealthClass::Failing),
            RemediationDecision::Restart(1)
        );
        assert_eq!(
            engine.decide(&a, HealthClass::Failing),
            RemediationDecision::Escalate(2)
        );
        assert_eq!(
            engine.decide(&b, HealthClass::Failing),
            RemediationDecision::Restart(1)
        );
    }
}
