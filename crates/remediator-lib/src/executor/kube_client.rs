//! Kubernetes API implementation of [`ClusterClient`]

use super::ClusterClient;
use crate::error::{RemediationError, Result};
use crate::models::PodIdentity;
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::Client;
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Default deadline for a single API call
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(30);

/// Cluster client backed by `kube`.
///
/// Every call is bounded by a deadline; a call that runs past it is reported
/// as a transport error.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
    timeout: Duration,
}

impl KubeClusterClient {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn call<T, F>(&self, operation: &'static str, request: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, kube::Error>>,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(RemediationError::transport(operation, e.to_string())),
            Err(_) => Err(RemediationError::transport(
                operation,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn read_pod(&self, identity: &PodIdentity) -> Result<Pod> {
        let api = self.pods(&identity.namespace);
        self.call("read pod", api.get(&identity.name)).await
    }

    async fn delete_pod(&self, identity: &PodIdentity) -> Result<()> {
        let api = self.pods(&identity.namespace);
        let params = DeleteParams::default();
        self.call("delete pod", api.delete(&identity.name, &params))
            .await?;
        Ok(())
    }

    async fn create_pod(&self, namespace: &str, manifest: Pod) -> Result<()> {
        let api = self.pods(namespace);
        let params = PostParams::default();
        self.call("create pod", api.create(&params, &manifest))
            .await?;
        Ok(())
    }

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>> {
        let api = self.deployments(namespace);
        let params = ListParams::default();
        let list = self.call("list deployments", api.list(&params)).await?;
        debug!(namespace = %namespace, count = list.items.len(), "Listed deployments");
        Ok(list.items)
    }

    async fn scale_deployment(&self, namespace: &str, name: &str, replicas: i32) -> Result<()> {
        let api = self.deployments(namespace);
        let params = PatchParams::default();
        let patch = Patch::Merge(json!({ "spec": { "replicas": replicas } }));
        self.call("scale deployment", api.patch_scale(name, &params, &patch))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::error::ErrorResponse;

    fn unreachable_client(timeout: Duration) -> KubeClusterClient {
        let config = kube::Config::new("http://127.0.0.1:1".parse().unwrap());
        KubeClusterClient::new(Client::try_from(config).unwrap(), timeout)
    }

    #[tokio::test]
    async fn test_call_past_deadline_is_transport_error() {
        let client = unreachable_client(Duration::from_millis(10));

        let err = client
            .call("read pod", std::future::pending::<kube::Result<Pod>>())
            .await
            .unwrap_err();

        match err {
            RemediationError::Transport { operation, message } => {
                assert_eq!(operation, "read pod");
                assert!(message.contains("timed out after 10ms"));
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_api_error_is_transport_error() {
        let client = unreachable_client(DEFAULT_API_TIMEOUT);

        let rejected = async {
            Err::<Pod, _>(kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: "pods \"web-0\" is forbidden".to_string(),
                reason: "Forbidden".to_string(),
                code: 403,
            }))
        };
        let err = client.call("delete pod", rejected).await.unwrap_err();

        match err {
            RemediationError::Transport { operation, message } => {
                assert_eq!(operation, "delete pod");
                assert!(message.contains("forbidden"));
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
