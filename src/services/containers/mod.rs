//! Microsoft.ContainerService: Kubernetes cluster IDs and state upgraders.

mod id;
mod migration;

pub use id::KubernetesClusterId;
pub use migration::{KubernetesClusterV0ToV1, KubernetesClusterV1ToV2};
