pub mod exporter;
pub mod publisher;
pub mod sink;

pub use exporter::PrometheusExporter;
pub use publisher::Publisher;
pub use sink::{Gauge, MemorySink, MetricsSink, PrometheusSink};

use crate::Result;
use prometheus::Registry;

/// Registry for the exporter. On Linux it also carries process metrics.
pub fn new_registry() -> Result<Registry> {
    let registry = Registry::new();

    #[cfg(target_os = "linux")]
    registry
        .register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))
        .map_err(|e| crate::PodscanError::MetricsError(e.to_string()))?;

    Ok(registry)
}
