use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};

/// A pod and the containers it declares, as seen during one discovery cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadRecord {
    pub namespace: String,
    pub name: String,
    pub containers: Vec<ContainerSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
}

impl WorkloadRecord {
    pub fn from_k8s_pod(pod: &Pod) -> Self {
        let metadata = &pod.metadata;

        let containers = pod
            .spec
            .as_ref()
            .map(|spec| {
                spec.containers
                    .iter()
                    .map(|c| ContainerSpec {
                        name: c.name.clone(),
                        image: c.image.clone().unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            namespace: metadata.namespace.clone().unwrap_or_default(),
            name: metadata.name.clone().unwrap_or_default(),
            containers,
        }
    }
}

/// Captured result of running a command inside a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    /// True only when the API server reported a `Success` exit status.
    pub success: bool,
    pub message: Option<String>,
}
