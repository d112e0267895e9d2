use crate::{McwatchError, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::{Api, Client};
use tracing::{debug, info};

#[derive(Clone)]
pub struct K8sClient {
    client: Client,
}

impl K8sClient {
    pub async fn try_default() -> Result<Self> {
        debug!("Initializing Kubernetes client");

        let client = Client::try_default().await.map_err(|e| {
            McwatchError::KubernetesError(format!("Failed to create K8s client: {}", e))
        })?;

        info!("Successfully connected to Kubernetes cluster");

        Ok(Self { client })
    }

    pub fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<Pod>> {
        let params = ListParams::default().labels(label_selector);

        let pod_list = self.pods(namespace).list(&params).await.map_err(|e| {
            McwatchError::KubernetesError(format!(
                "Failed to list pods in {} with selector {}: {}",
                namespace, label_selector, e
            ))
        })?;

        Ok(pod_list.items)
    }
}
