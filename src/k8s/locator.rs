//! Pod discovery
//!
//! Finds the running game server pod behind a label selector. Every failure
//! (auth, network, API) is reported as "not found" so the caller has a single
//! retry path.

use crate::k8s::client::K8sClient;
use crate::k8s::types::{PodHandle, PodInfo, Target};
use crate::{McwatchError, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

#[async_trait]
pub trait PodLocator: Send + Sync {
    /// Find a running pod for `target`, or `None` if there is none right now
    async fn locate(&self, target: &Target) -> Option<PodHandle>;
}

/// Pick the first running pod in listing order
pub fn select_running(pods: &[PodInfo], container: &str) -> Option<PodHandle> {
    pods.iter()
        .find(|pod| pod.is_running())
        .map(|pod| PodHandle::new(pod, container))
}

/// Like [`select_running`], but an empty result is a `DiscoveryFailure`
pub fn running_pod(pods: &[PodInfo], target: &Target) -> Result<PodHandle> {
    select_running(pods, &target.container).ok_or_else(|| McwatchError::DiscoveryFailure {
        namespace: target.namespace.clone(),
        selector: target.label_selector.clone(),
    })
}

pub struct KubePodLocator {
    client: K8sClient,
}

impl KubePodLocator {
    pub fn new(client: K8sClient) -> Self {
        Self { client }
    }

    async fn find(&self, target: &Target) -> Result<PodHandle> {
        let pods = self
            .client
            .list_pods(&target.namespace, &target.label_selector)
            .await?;

        let infos: Vec<PodInfo> = pods.iter().map(PodInfo::from_k8s_pod).collect();
        debug!(
            "Found {} pods matching {} in {}",
            infos.len(),
            target.label_selector,
            target.namespace
        );

        running_pod(&infos, target)
    }
}

#[async_trait]
impl PodLocator for KubePodLocator {
    async fn locate(&self, target: &Target) -> Option<PodHandle> {
        match self.find(target).await {
            Ok(handle) => Some(handle),
            Err(e @ McwatchError::DiscoveryFailure { .. }) => {
                debug!("{}", e);
                None
            }
            Err(e) => {
                warn!("Error listing pods: {}", e);
                None
            }
        }
    }
}
