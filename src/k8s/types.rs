use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_LABEL_SELECTOR: &str = "app=minecraft-bedrock";
pub const DEFAULT_CONTAINER: &str = "minecraft";

pub const PHASE_RUNNING: &str = "Running";

/// Which workload to follow: where to look, how to match it, which container to read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub namespace: String,
    pub label_selector: String,
    pub container: String,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            label_selector: DEFAULT_LABEL_SELECTOR.to_string(),
            container: DEFAULT_CONTAINER.to_string(),
        }
    }
}

/// Summary of a pod returned by a list call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodInfo {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    pub phase: String,
}

impl PodInfo {
    pub fn from_k8s_pod(pod: &k8s_openapi::api::core::v1::Pod) -> Self {
        let metadata = &pod.metadata;
        let status = pod.status.as_ref();

        Self {
            name: metadata.name.clone().unwrap_or_default(),
            namespace: metadata.namespace.clone().unwrap_or_default(),
            uid: metadata.uid.clone().unwrap_or_default(),
            phase: status
                .and_then(|s| s.phase.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == PHASE_RUNNING
    }
}

/// The log source currently being followed.
///
/// Only valid for one stream session; a new handle is located for every
/// reconnection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodHandle {
    pub name: String,
    pub namespace: String,
    pub container: String,
    pub uid: String,
}

impl PodHandle {
    pub fn new(pod: &PodInfo, container: &str) -> Self {
        Self {
            name: pod.name.clone(),
            namespace: pod.namespace.clone(),
            container: container.to_string(),
            uid: pod.uid.clone(),
        }
    }
}

impl fmt::Display for PodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}[{}]", self.namespace, self.name, self.container)
    }
}
