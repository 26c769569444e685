//! Pod restart by delete and recreate

use super::ClusterClient;
use crate::error::Result;
use crate::models::PodIdentity;
use k8s_openapi::api::core::v1::Pod;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default wait between deleting a pod and recreating it
pub const DEFAULT_RESTART_GRACE: Duration = Duration::from_secs(5);

/// Strip the server-assigned metadata that must not be resubmitted on create.
/// The pod spec and all other metadata are preserved.
pub fn sanitize_manifest(mut pod: Pod, namespace: &str) -> Pod {
    pod.metadata.resource_version = None;
    pod.metadata.uid = None;
    pod.metadata.creation_timestamp = None;
    pod.metadata.self_link = None;
    pod.metadata.namespace = Some(namespace.to_string());
    pod
}

/// Restarts a pod by deleting it and recreating it from its own manifest.
///
/// Not transactional: if the process dies between delete and create the pod
/// stays gone, and no further events arrive for it.
pub struct RestartExecutor {
    client: Arc<dyn ClusterClient>,
    grace: Duration,
}

impl RestartExecutor {
    pub fn new(client: Arc<dyn ClusterClient>, grace: Duration) -> Self {
        Self { client, grace }
    }

    /// Read, sanitize, delete, wait, recreate. Stops at the first failing step.
    pub async fn restart(&self, identity: &PodIdentity) -> Result<()> {
        let current = self.client.read_pod(identity).await?;
        let manifest = sanitize_manifest(current, &identity.namespace);

        self.client.delete_pod(identity).await?;
        info!(pod = %identity, "Deleted pod");

        debug!(
            pod = %identity,
            grace_secs = self.grace.as_secs_f64(),
            "Waiting for pod termination"
        );
        tokio::time::sleep(self.grace).await;

        self.client
            .create_pod(&identity.namespace, manifest)
            .await?;
        info!(pod = %identity, "Recreated pod");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::mock::{live_pod, MockCluster};

    fn executor(cluster: Arc<MockCluster>) -> RestartExecutor {
        RestartExecutor::new(cluster, Duration::ZERO)
    }

    #[test]
    fn test_sanitize_manifest_strips_server_fields() {
        let identity = PodIdentity::new("payments", "api-0");
        let mut pod = live_pod(&identity);
        pod.metadata.namespace = None;
        pod.metadata.labels = Some([("app".to_string(), "api".to_string())].into());

        let sanitized = sanitize_manifest(pod, "payments");

        assert!(sanitized.metadata.resource_version.is_none());
        assert!(sanitized.metadata.uid.is_none());
        assert!(sanitized.metadata.creation_timestamp.is_none());
        assert!(sanitized.metadata.self_link.is_none());
        assert_eq!(sanitized.metadata.namespace.as_deref(), Some("payments"));
        assert_eq!(sanitized.metadata.name.as_deref(), Some("api-0"));
        assert!(sanitized.metadata.labels.is_some());
        assert!(sanitized.spec.is_some());
    }

    #[tokio::test]
    async fn test_restart_deletes_then_creates() {
        let cluster = Arc::new(MockCluster::new());
        let identity = PodIdentity::new("default", "web-1");

        executor(cluster.clone()).restart(&identity).await.unwrap();

        assert_eq!(
            cluster.calls(),
            vec![
                "read default/web-1",
                "delete default/web-1",
                "create default/web-1",
            ]
        );

        let created = cluster.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert!(created[0].metadata.uid.is_none());
        assert!(created[0].metadata.resource_version.is_none());
    }

    #[tokio::test]
    async fn test_read_failure_aborts_before_delete() {
        let cluster = Arc::new(MockCluster::new());
        cluster.fail("read");

        let result = executor(cluster.clone())
            .restart(&PodIdentity::new("default", "web-1"))
            .await;

        assert!(result.is_err());
        assert_eq!(cluster.calls(), vec!["read default/web-1"]);
    }

    #[tokio::test]
    async fn test_delete_failure_never_creates() {
        let cluster = Arc::new(MockCluster::new());
        cluster.fail("delete");

        let result = executor(cluster.clone())
            .restart(&PodIdentity::new("default", "web-1"))
            .await;

        assert!(result.is_err());
        assert_eq!(
            cluster.calls(),
            vec!["read default/web-1", "delete default/web-1"]
        );
        assert!(cluster.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_is_reported() {
        let cluster = Arc::new(MockCluster::new());
        cluster.fail("create");

        let err = executor(cluster.clone())
            .restart(&PodIdentity::new("default", "web-1"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("create"));
    }

    #[tokio::test]
    async fn test_grace_interval_is_waited() {
        let cluster = Arc::new(MockCluster::new());
        let executor = RestartExecutor::new(cluster, Duration::from_millis(50));

        let start = std::time::Instant::now();
        executor
            .restart(&PodIdentity::new("default", "web-1"))
            .await
            .unwrap();

        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
