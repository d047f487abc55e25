use crate::k8s::types::{ExecOutput, WorkloadRecord};
use crate::Result;
use async_trait::async_trait;

/// Read access to the cluster's workloads plus the ability to exec into them.
///
/// `K8sClient` is the production implementation; tests substitute in-memory
/// fakes.
#[async_trait]
pub trait WorkloadDirectory: Send + Sync {
    /// List every workload across all namespaces.
    async fn list_workloads(&self) -> Result<Vec<WorkloadRecord>>;

    /// Run `command` in `container` of `pod` and capture its output.
    ///
    /// An `Err` means the exec channel could not be established. A command
    /// that ran but did not succeed is reported through `ExecOutput::success`.
    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[String],
    ) -> Result<ExecOutput>;
}
