//! Pod event source
//!
//! Turns the Kubernetes pod watch into a stream of [`PodObservation`]s.

use crate::models::{ConditionStatus, PodCondition, PodIdentity, PodObservation, PodPhase};
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client};
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

/// Normalize a pod resource into an observation.
///
/// Returns `None` for pods that carry nothing to classify yet: no name, or
/// no recognized phase.
pub fn observation_from_pod(pod: &Pod) -> Option<PodObservation> {
    let name = pod.metadata.name.clone()?;
    let namespace = pod
        .metadata
        .namespace
        .clone()
        .unwrap_or_else(|| "default".to_string());

    let status = pod.status.as_ref();
    let Some(phase) = status
        .and_then(|s| s.phase.as_deref())
        .and_then(PodPhase::parse)
    else {
        debug!(namespace = %namespace, pod = %name, "Skipping pod without a recognized phase");
        return None;
    };

    let conditions = status
        .and_then(|s| s.conditions.as_ref())
        .map(|conditions| {
            conditions
                .iter()
                .map(|c| PodCondition::new(c.type_.clone(), ConditionStatus::parse(&c.status)))
                .collect()
        })
        .unwrap_or_default();

    Some(PodObservation::new(
        PodIdentity::new(namespace, name),
        phase,
        conditions,
    ))
}

/// Watch pods cluster-wide, or in one namespace, as observations.
///
/// Applied objects and the initial listing are observed; deletions are not.
/// Transient watch errors are retried with the watcher's default backoff and
/// also surfaced to the consumer for logging.
pub fn watch_pods(
    client: Client,
    namespace: Option<&str>,
) -> impl Stream<Item = Result<PodObservation, watcher::Error>> + Send {
    let api: Api<Pod> = match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    };

    watcher(api, watcher::Config::default())
        .default_backoff()
        .applied_objects()
        .filter_map(|event| match event {
            Ok(pod) => observation_from_pod(&pod).map(Ok),
            Err(e) => Some(Err(e)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{PodCondition as K8sCondition, PodStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn pod(name: Option<&str>, phase: Option<&str>, conditions: &[(&str, &str)]) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: name.map(String::from),
                namespace: Some("shop".to_string()),
                ..ObjectMeta::default()
            },
            spec: None,
            status: Some(PodStatus {
                phase: phase.map(String::from),
                conditions: Some(
                    conditions
                        .iter()
                        .map(|(t, s)| K8sCondition {
                            type_: t.to_string(),
                            status: s.to_string(),
                            ..K8sCondition::default()
                        })
                        .collect(),
                ),
                ..PodStatus::default()
            }),
        }
    }

    #[test]
    fn test_running_pod_is_normalized() {
        let obs = observation_from_pod(&pod(
            Some("cart-0"),
            Some("Running"),
            &[("Ready", "False"), ("ContainersReady", "True")],
        ))
        .unwrap();

        assert_eq!(obs.identity(), &PodIdentity::new("shop", "cart-0"));
        assert_eq!(obs.phase(), PodPhase::Running);
        assert_eq!(
            obs.conditions(),
            &[
                PodCondition::new("Ready", ConditionStatus::False),
                PodCondition::new("ContainersReady", ConditionStatus::True),
            ]
        );
    }

    #[test]
    fn test_pod_without_phase_is_skipped() {
        assert!(observation_from_pod(&pod(Some("cart-0"), None, &[])).is_none());
        assert!(observation_from_pod(&pod(Some("cart-0"), Some("Evicted"), &[])).is_none());
    }

    #[test]
    fn test_pod_without_name_is_skipped() {
        assert!(observation_from_pod(&pod(None, Some("Failed"), &[])).is_none());
    }

    #[test]
    fn test_missing_conditions_are_empty() {
        let mut p = pod(Some("cart-0"), Some("Failed"), &[]);
        if let Some(status) = p.status.as_mut() {
            status.conditions = None;
        }

        let obs = observation_from_pod(&p).unwrap();
        assert!(obs.conditions().is_empty());
    }
}
