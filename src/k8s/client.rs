use crate::k8s::directory::WorkloadDirectory;
use crate::k8s::types::{ExecOutput, WorkloadRecord};
use crate::{PodscanError, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::api::{AttachParams, ListParams};
use kube::{Api, Client};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

pub struct K8sClient {
    client: Client,
}

impl K8sClient {
    pub async fn try_default() -> Result<Self> {
        debug!("Initializing Kubernetes client");

        let client = Client::try_default().await.map_err(|e| {
            PodscanError::KubernetesError(format!("Failed to create K8s client: {}", e))
        })?;

        info!("Successfully connected to Kubernetes cluster");

        Ok(Self { client })
    }

    pub fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn pods_all(&self) -> Api<Pod> {
        Api::all(self.client.clone())
    }

    pub async fn list_pods(&self) -> Result<Vec<Pod>> {
        let pod_list = self
            .pods_all()
            .list(&ListParams::default())
            .await
            .map_err(|e| PodscanError::KubernetesError(format!("Failed to list pods: {}", e)))?;

        Ok(pod_list.items)
    }
}

#[async_trait]
impl WorkloadDirectory for K8sClient {
    async fn list_workloads(&self) -> Result<Vec<WorkloadRecord>> {
        let pods = self.list_pods().await?;
        Ok(pods.iter().map(WorkloadRecord::from_k8s_pod).collect())
    }

    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput> {
        let exec_error = |reason: String| PodscanError::ExecFailed {
            namespace: namespace.to_string(),
            pod: pod.to_string(),
            container: container.to_string(),
            reason,
        };

        let params = AttachParams::default()
            .container(container)
            .stdin(false)
            .stdout(true)
            .stderr(true);

        let mut attached = self
            .pods(namespace)
            .exec(pod, command.to_vec(), &params)
            .await
            .map_err(|e| exec_error(e.to_string()))?;

        let status = attached.take_status();
        let (stdout, stderr) = tokio::try_join!(
            drain(attached.stdout()),
            drain(attached.stderr())
        )
        .map_err(|e| exec_error(format!("failed to read exec output: {}", e)))?;

        let status = match status {
            Some(status) => status.await,
            None => None,
        };

        attached
            .join()
            .await
            .map_err(|e| exec_error(e.to_string()))?;

        let (success, message) = exec_outcome(status);

        Ok(ExecOutput {
            stdout,
            stderr,
            success,
            message,
        })
    }
}

/// Map the exec status reported by the API server to `(success, message)`.
/// Only an explicit `Success` counts; a missing status is a failure.
fn exec_outcome(status: Option<Status>) -> (bool, Option<String>) {
    match status {
        Some(status) => {
            let success = status.status.as_deref() == Some("Success");
            let message = status.message.or(status.reason);
            (success, message)
        }
        None => (false, Some("no exit status reported".to_string())),
    }
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) -> std::io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
