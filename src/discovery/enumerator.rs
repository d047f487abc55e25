use crate::k8s::{WorkloadDirectory, WorkloadRecord};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Enumerator {
    directory: Arc<dyn WorkloadDirectory>,
}

impl Enumerator {
    pub fn new(directory: Arc<dyn WorkloadDirectory>) -> Self {
        Self { directory }
    }

    /// List all workloads cluster-wide. `None` means the cycle should be
    /// abandoned and previously published metrics left in place.
    pub async fn enumerate(&self) -> Option<Vec<WorkloadRecord>> {
        match self.directory.list_workloads().await {
            Ok(workloads) => {
                debug!("Enumerated {} workloads", workloads.len());
                Some(workloads)
            }
            Err(e) => {
                warn!(error = %e, "Failed to list workloads, keeping previous metrics");
                None
            }
        }
    }
}
