//! Gauge sinks
//!
//! The publisher only talks to `MetricsSink`, so the pipeline can be driven
//! against a real Prometheus registry or an in-memory table.

use crate::{PodscanError, Result};
use prometheus::{IntGauge, IntGaugeVec, Opts, Registry};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// The four gauges exported by podscan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gauge {
    PodsPerNamespace,
    ContainerImageCount,
    ContainerBaseImageType,
    FipsCompliantContainers,
}

impl Gauge {
    pub const ALL: [Gauge; 4] = [
        Gauge::PodsPerNamespace,
        Gauge::ContainerImageCount,
        Gauge::ContainerBaseImageType,
        Gauge::FipsCompliantContainers,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Gauge::PodsPerNamespace => "pods_per_namespace",
            Gauge::ContainerImageCount => "container_image_count",
            Gauge::ContainerBaseImageType => "container_base_image_type",
            Gauge::FipsCompliantContainers => "containers_fips_compliant",
        }
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Gauge::PodsPerNamespace => "Number of pods running in each namespace",
            Gauge::ContainerImageCount => "Number of containers running each image",
            Gauge::ContainerBaseImageType => {
                "Number of containers running each base image type based on /etc/os-release"
            }
            Gauge::FipsCompliantContainers => {
                "Total number of containers running in FIPS-compliant mode"
            }
        }
    }

    /// Label name for labelled gauges, `None` for the scalar gauge.
    pub const fn label(&self) -> Option<&'static str> {
        match self {
            Gauge::PodsPerNamespace => Some("namespace"),
            Gauge::ContainerImageCount => Some("image"),
            Gauge::ContainerBaseImageType => Some("base_type"),
            Gauge::FipsCompliantContainers => None,
        }
    }
}

impl std::fmt::Display for Gauge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub trait MetricsSink: Send + Sync {
    /// Drop every label combination of `gauge`. The scalar gauge is set to 0.
    fn reset(&self, gauge: Gauge);

    /// Set `gauge` for `label`. The label is ignored for the scalar gauge.
    fn set(&self, gauge: Gauge, label: Option<&str>, value: i64);
}

/// Sink backed by gauges registered in a `prometheus::Registry`.
pub struct PrometheusSink {
    pods_per_namespace: IntGaugeVec,
    container_image_count: IntGaugeVec,
    container_base_image_type: IntGaugeVec,
    fips_compliant: IntGauge,
}

impl PrometheusSink {
    pub fn new(registry: &Registry) -> Result<Self> {
        let sink = Self {
            pods_per_namespace: labelled_gauge(Gauge::PodsPerNamespace)?,
            container_image_count: labelled_gauge(Gauge::ContainerImageCount)?,
            container_base_image_type: labelled_gauge(Gauge::ContainerBaseImageType)?,
            fips_compliant: IntGauge::new(
                Gauge::FipsCompliantContainers.name(),
                Gauge::FipsCompliantContainers.help(),
            )
            .map_err(metrics_error)?,
        };

        registry
            .register(Box::new(sink.pods_per_namespace.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(sink.container_image_count.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(sink.container_base_image_type.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(sink.fips_compliant.clone()))
            .map_err(metrics_error)?;

        Ok(sink)
    }

    fn vec(&self, gauge: Gauge) -> Option<&IntGaugeVec> {
        match gauge {
            Gauge::PodsPerNamespace => Some(&self.pods_per_namespace),
            Gauge::ContainerImageCount => Some(&self.container_image_count),
            Gauge::ContainerBaseImageType => Some(&self.container_base_image_type),
            Gauge::FipsCompliantContainers => None,
        }
    }
}

impl MetricsSink for PrometheusSink {
    fn reset(&self, gauge: Gauge) {
        match self.vec(gauge) {
            Some(vec) => vec.reset(),
            None => self.fips_compliant.set(0),
        }
    }

    fn set(&self, gauge: Gauge, label: Option<&str>, value: i64) {
        match self.vec(gauge) {
            Some(vec) => vec
                .with_label_values(&[label.unwrap_or_default()])
                .set(value),
            None => self.fips_compliant.set(value),
        }
    }
}

fn labelled_gauge(gauge: Gauge) -> Result<IntGaugeVec> {
    let label = gauge.label().unwrap_or_default();
    IntGaugeVec::new(Opts::new(gauge.name(), gauge.help()), &[label]).map_err(metrics_error)
}

fn metrics_error(e: prometheus::Error) -> PodscanError {
    PodscanError::MetricsError(e.to_string())
}

/// In-memory sink. Used by the one-shot `scan` command and by tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    values: Mutex<BTreeMap<Gauge, BTreeMap<String, i64>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for `gauge` and `label`. Use `""` for the scalar gauge.
    pub fn get(&self, gauge: Gauge, label: &str) -> Option<i64> {
        self.lock().get(&gauge).and_then(|m| m.get(label)).copied()
    }

    pub fn labels(&self, gauge: Gauge) -> Vec<String> {
        self.lock()
            .get(&gauge)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn values(&self) -> BTreeMap<Gauge, BTreeMap<String, i64>> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<Gauge, BTreeMap<String, i64>>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MetricsSink for MemorySink {
    fn reset(&self, gauge: Gauge) {
        let mut values = self.lock();
        match gauge.label() {
            Some(_) => {
                values.remove(&gauge);
            }
            None => {
                values.entry(gauge).or_default().insert(String::new(), 0);
            }
        }
    }

    fn set(&self, gauge: Gauge, label: Option<&str>, value: i64) {
        let label = match gauge.label() {
            Some(_) => label.unwrap_or_default().to_string(),
            None => String::new(),
        };
        self.lock().entry(gauge).or_default().insert(label, value);
    }
}
