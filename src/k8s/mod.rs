pub mod client;
pub mod directory;
pub mod types;

pub use client::K8sClient;
pub use directory::WorkloadDirectory;
pub use types::{ContainerSpec, ExecOutput, WorkloadRecord};
