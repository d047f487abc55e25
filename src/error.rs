use thiserror::Error;

#[derive(Error, Debug)]
pub enum PodscanError {
    #[error("Kubernetes error: {0}")]
    KubernetesError(String),

    #[error("Exec failed in {namespace}/{pod} container {container}: {reason}")]
    ExecFailed {
        namespace: String,
        pod: String,
        container: String,
        reason: String,
    },

    #[error("Discovery cycle {0}")]
    CycleIncomplete(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PodscanError>;
