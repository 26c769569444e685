//! Scaling a failing pod's deployment to zero

use super::ClusterClient;
use crate::error::Result;
use crate::models::PodIdentity;
use k8s_openapi::api::apps::v1::Deployment;
use std::sync::Arc;
use tracing::{info, warn};

/// Picks the deployment that owns a pod from the deployments of its namespace
pub trait DeploymentResolver: Send + Sync {
    fn resolve<'a>(&self, pod: &PodIdentity, deployments: &'a [Deployment])
        -> Option<&'a Deployment>;
}

/// Matches by name: the first deployment whose name contains the pod name.
///
/// This is a naming-convention heuristic, not an ownership lookup. Pods
/// created by a deployment are usually named `<deployment>-<hash>-<suffix>`,
/// which this rule only matches when the deployment name itself contains the
/// full pod name.
#[derive(Debug, Default, Clone, Copy)]
pub struct NameSubstringResolver;

impl DeploymentResolver for NameSubstringResolver {
    fn resolve<'a>(
        &self,
        pod: &PodIdentity,
        deployments: &'a [Deployment],
    ) -> Option<&'a Deployment> {
        deployments.iter().find(|d| {
            d.metadata
                .name
                .as_deref()
                .map(|name| name.contains(pod.name.as_str()))
                .unwrap_or(false)
        })
    }
}

pub struct ScaleDownExecutor {
    client: Arc<dyn ClusterClient>,
    resolver: Box<dyn DeploymentResolver>,
}

impl ScaleDownExecutor {
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self::with_resolver(client, Box::new(NameSubstringResolver))
    }

    pub fn with_resolver(
        client: Arc<dyn ClusterClient>,
        resolver: Box<dyn DeploymentResolver>,
    ) -> Self {
        Self { client, resolver }
    }

    /// Set the owning deployment's replicas to zero.
    ///
    /// Returns the name of the deployment that was scaled, or `None` when no
    /// deployment in the namespace matched.
    pub async fn scale_down(&self, identity: &PodIdentity) -> Result<Option<String>> {
        let deployments = self.client.list_deployments(&identity.namespace).await?;

        let Some(name) = self
            .resolver
            .resolve(identity, &deployments)
            .and_then(|d| d.metadata.name.clone())
        else {
            warn!(pod = %identity, "No owning deployment found, nothing to scale down");
            return Ok(None);
        };

        self.client
            .scale_deployment(&identity.namespace, &name, 0)
            .await?;
        info!(pod = %identity, deployment = %name, "Scaled down deployment");

        Ok(Some(name))
    }
}
