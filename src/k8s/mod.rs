pub mod client;
pub mod locator;
pub mod logs;
pub mod types;

pub use client::K8sClient;
pub use locator::{KubePodLocator, PodLocator};
pub use logs::{KubeLogSource, LogSource, SessionState, StreamSession};
pub use types::{PodHandle, PodInfo, Target};
