//! Container introspection via exec
//!
//! Runs the diagnostic command in one container and reduces every failure
//! mode to `InspectionResult::Failed`, so a single container can never abort
//! a discovery cycle.

use crate::k8s::{ContainerSpec, WorkloadDirectory, WorkloadRecord};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Outcome of inspecting one container. Both variants carry the image
/// reference so the image-name heuristic can always be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectionResult {
    Content { image: String, content: String },
    Failed { image: String, reason: String },
}

impl InspectionResult {
    pub fn image(&self) -> &str {
        match self {
            InspectionResult::Content { image, .. } | InspectionResult::Failed { image, .. } => {
                image
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, InspectionResult::Failed { .. })
    }
}

pub struct Inspector {
    directory: Arc<dyn WorkloadDirectory>,
    command: Vec<String>,
    timeout: Duration,
}

impl Inspector {
    pub fn new(directory: Arc<dyn WorkloadDirectory>, command: Vec<String>, timeout: Duration) -> Self {
        Self {
            directory,
            command,
            timeout,
        }
    }

    pub async fn inspect(
        &self,
        workload: &WorkloadRecord,
        container: &ContainerSpec,
    ) -> InspectionResult {
        let exec = self.directory.exec(
            &workload.namespace,
            &workload.name,
            &container.name,
            &self.command,
        );

        let failed = |reason: String| {
            debug!(
                namespace = %workload.namespace,
                pod = %workload.name,
                container = %container.name,
                reason = %reason,
                "Container inspection failed"
            );
            InspectionResult::Failed {
                image: container.image.clone(),
                reason,
            }
        };

        match tokio::time::timeout(self.timeout, exec).await {
            Err(_) => failed(format!("exec timed out after {:?}", self.timeout)),
            Ok(Err(e)) => failed(e.to_string()),
            Ok(Ok(output)) if !output.success => {
                let reason = match (output.message, output.stderr.trim()) {
                    (Some(message), "") => message,
                    (Some(message), stderr) => format!("{}, stderr: {}", message, stderr),
                    (None, "") => "command did not report success".to_string(),
                    (None, stderr) => format!("stderr: {}", stderr),
                };
                failed(reason)
            }
            Ok(Ok(output)) => InspectionResult::Content {
                image: container.image.clone(),
                content: output.stdout,
            },
        }
    }
}
