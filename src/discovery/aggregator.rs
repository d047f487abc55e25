//! Per-cycle aggregation of workloads and container classifications
//!
//! Counts are keyed by namespace, image reference and base-type tag. A fresh
//! `Aggregator` is built every cycle; nothing carries over.

use crate::discovery::classifier::Classification;
use crate::k8s::{ContainerSpec, WorkloadRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts produced by one discovery cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub pods_per_namespace: BTreeMap<String, u64>,
    pub images: BTreeMap<String, u64>,
    pub base_types: BTreeMap<String, u64>,
    pub compliant_containers: u64,
}

impl AggregateSnapshot {
    pub fn workload_count(&self) -> u64 {
        self.pods_per_namespace.values().sum()
    }

    pub fn container_count(&self) -> u64 {
        self.base_types.values().sum()
    }
}

#[derive(Debug, Default)]
pub struct Aggregator {
    snapshot: AggregateSnapshot,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a workload once, independent of how many containers it has.
    pub fn record_workload(&mut self, workload: &WorkloadRecord) {
        *self
            .snapshot
            .pods_per_namespace
            .entry(workload.namespace.clone())
            .or_insert(0) += 1;
    }

    pub fn record_container(&mut self, container: &ContainerSpec, classification: &Classification) {
        *self
            .snapshot
            .images
            .entry(container.image.clone())
            .or_insert(0) += 1;
        *self
            .snapshot
            .base_types
            .entry(classification.base_type.clone())
            .or_insert(0) += 1;

        if classification.compliant {
            self.snapshot.compliant_containers += 1;
        }
    }

    pub fn finish(self) -> AggregateSnapshot {
        self.snapshot
    }
}
