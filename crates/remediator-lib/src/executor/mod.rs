//! Remediation actions against the cluster
//!
//! This module provides:
//! - The [`ClusterClient`] boundary to the Kubernetes API
//! - Restart executor (delete + recreate a pod)
//! - Scale-down executor (set the owning deployment's replicas to zero)
//!
//! Neither executor retries internally. A failed step aborts the action and
//! is reported to the caller; the next failing observation of the same pod
//! is the retry.

mod kube_client;
mod restart;
mod scale_down;

pub use kube_client::{KubeClusterClient, DEFAULT_API_TIMEOUT};
pub use restart::{sanitize_manifest, RestartExecutor, DEFAULT_RESTART_GRACE};
pub use scale_down::{DeploymentResolver, NameSubstringResolver, ScaleDownExecutor};

use crate::error::Result;
use crate::models::PodIdentity;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;

pub use async_trait::async_trait;

/// Pod and deployment operations the executors need from the cluster
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Read the current pod resource
    async fn read_pod(&self, identity: &PodIdentity) -> Result<Pod>;

    /// Delete a pod by identity
    async fn delete_pod(&self, identity: &PodIdentity) -> Result<()>;

    /// Create a pod from a manifest in the given namespace
    async fn create_pod(&self, namespace: &str, manifest: Pod) -> Result<()>;

    /// List the deployments of a namespace
    async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>>;

    /// Set a deployment's desired replica count
    async fn scale_deployment(&self, namespace: &str, name: &str, replicas: i32) -> Result<()>;
}
