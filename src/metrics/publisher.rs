use crate::discovery::aggregator::AggregateSnapshot;
use crate::metrics::sink::{Gauge, MetricsSink};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Writes snapshots into a `MetricsSink`, clearing every previously
/// published label combination first.
pub struct Publisher {
    sink: Arc<dyn MetricsSink>,
}

impl Publisher {
    pub fn new(sink: Arc<dyn MetricsSink>) -> Self {
        Self { sink }
    }

    pub fn publish(&self, snapshot: &AggregateSnapshot) {
        for gauge in Gauge::ALL {
            self.sink.reset(gauge);
        }

        self.set_all(Gauge::PodsPerNamespace, &snapshot.pods_per_namespace);
        self.set_all(Gauge::ContainerImageCount, &snapshot.images);
        self.set_all(Gauge::ContainerBaseImageType, &snapshot.base_types);
        self.sink.set(
            Gauge::FipsCompliantContainers,
            None,
            saturating_i64(snapshot.compliant_containers),
        );

        debug!(
            namespaces = snapshot.pods_per_namespace.len(),
            images = snapshot.images.len(),
            base_types = snapshot.base_types.len(),
            "Published snapshot"
        );
    }

    fn set_all(&self, gauge: Gauge, counts: &BTreeMap<String, u64>) {
        for (label, count) in counts {
            self.sink.set(gauge, Some(label), saturating_i64(*count));
        }
    }
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::sink::MemorySink;

    fn snapshot(base_types: &[(&str, u64)], compliant: u64) -> AggregateSnapshot {
        let base_types: BTreeMap<String, u64> = base_types
            .iter()
            .map(|(tag, count)| (tag.to_string(), *count))
            .collect();
        let total: u64 = base_types.values().sum();

        AggregateSnapshot {
            pods_per_namespace: BTreeMap::from([("default".to_string(), total)]),
            images: BTreeMap::from([("app:1".to_string(), total)]),
            base_types,
            compliant_containers: compliant,
        }
    }

    #[test]
    fn test_publish_sets_every_gauge() {
        let sink = Arc::new(MemorySink::new());
        let publisher = Publisher::new(sink.clone());

        publisher.publish(&snapshot(&[("Debian", 2), ("Unknown", 1)], 1));

        assert_eq!(sink.get(Gauge::PodsPerNamespace, "default"), Some(3));
        assert_eq!(sink.get(Gauge::ContainerImageCount, "app:1"), Some(3));
        assert_eq!(sink.get(Gauge::ContainerBaseImageType, "Debian"), Some(2));
        assert_eq!(sink.get(Gauge::ContainerBaseImageType, "Unknown"), Some(1));
        assert_eq!(sink.get(Gauge::FipsCompliantContainers, ""), Some(1));
    }

    #[test]
    fn test_stale_labels_are_cleared() {
        let sink = Arc::new(MemorySink::new());
        let publisher = Publisher::new(sink.clone());

        publisher.publish(&snapshot(&[("Alpine", 1), ("Debian", 1)], 2));
        publisher.publish(&snapshot(&[("Debian", 1)], 0));

        assert_eq!(sink.labels(Gauge::ContainerBaseImageType), vec!["Debian"]);
        assert_eq!(sink.get(Gauge::FipsCompliantContainers, ""), Some(0));
    }

    #[test]
    fn test_empty_snapshot_clears_everything() {
        let sink = Arc::new(MemorySink::new());
        let publisher = Publisher::new(sink.clone());

        publisher.publish(&snapshot(&[("RHEL", 4)], 4));
        publisher.publish(&AggregateSnapshot::default());

        for gauge in [
            Gauge::PodsPerNamespace,
            Gauge::ContainerImageCount,
            Gauge::ContainerBaseImageType,
        ] {
            assert!(sink.labels(gauge).is_empty(), "{}", gauge);
        }
        assert_eq!(sink.get(Gauge::FipsCompliantContainers, ""), Some(0));
    }
}
