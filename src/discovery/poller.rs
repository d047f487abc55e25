//! Fixed-interval discovery driver
//!
//! Each tick runs enumerate → inspect → classify → aggregate → publish.
//! Inspections run with bounded concurrency but results are collected in
//! enumeration order before folding. Publication only happens after every
//! inspection has finished, so a cycle that times out or is cancelled leaves
//! the previously published gauges untouched.

use crate::config::Config;
use crate::discovery::aggregator::{AggregateSnapshot, Aggregator};
use crate::discovery::classifier::{Classification, Classifier};
use crate::discovery::enumerator::Enumerator;
use crate::discovery::inspector::Inspector;
use crate::k8s::{ContainerSpec, WorkloadDirectory, WorkloadRecord};
use crate::metrics::{MetricsSink, Publisher};
use crate::Result;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Published(AggregateSnapshot),
    /// Enumeration failed; nothing was published.
    Skipped,
    TimedOut,
}

pub struct Poller {
    enumerator: Enumerator,
    inspector: Inspector,
    classifier: Classifier,
    publisher: Publisher,
    interval: Duration,
    cycle_timeout: Duration,
    concurrency: usize,
}

impl Poller {
    /// Build a poller from `config`, which is validated first.
    pub fn new(
        directory: Arc<dyn WorkloadDirectory>,
        sink: Arc<dyn MetricsSink>,
        config: &Config,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            enumerator: Enumerator::new(directory.clone()),
            inspector: Inspector::new(
                directory,
                config.inspect_command.clone(),
                config.exec_timeout(),
            ),
            classifier: Classifier::new(&config.classifier),
            publisher: Publisher::new(sink),
            interval: config.poll_interval(),
            cycle_timeout: config.cycle_timeout(),
            concurrency: config.max_concurrent_inspections,
        })
    }

    /// Run cycles until `shutdown` is cancelled. The first cycle starts
    /// immediately; a slow cycle delays the next tick instead of overlapping.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            "Starting workload discovery every {:?} ({} concurrent inspections)",
            self.interval, self.concurrency
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = shutdown.cancelled() => {
                            info!("Shutdown requested, abandoning in-flight cycle");
                            break;
                        }
                        outcome = self.run_cycle() => {
                            debug!("Cycle finished: {}", outcome.label());
                        }
                    }
                }
            }
        }

        info!("Workload discovery stopped");
    }

    pub async fn run_cycle(&self) -> CycleOutcome {
        let started = Instant::now();

        let snapshot = match tokio::time::timeout(self.cycle_timeout, self.collect()).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return CycleOutcome::Skipped,
            Err(_) => {
                warn!(
                    "Discovery cycle exceeded {:?}, keeping previous metrics",
                    self.cycle_timeout
                );
                return CycleOutcome::TimedOut;
            }
        };

        self.publisher.publish(&snapshot);

        info!(
            pod_count = snapshot.workload_count(),
            container_count = snapshot.container_count(),
            fips_compliant = snapshot.compliant_containers,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Updated metrics"
        );

        CycleOutcome::Published(snapshot)
    }

    /// Enumerate, inspect and aggregate without publishing.
    pub async fn collect(&self) -> Option<AggregateSnapshot> {
        let workloads = self.enumerator.enumerate().await?;

        let targets: Vec<(&WorkloadRecord, &ContainerSpec)> = workloads
            .iter()
            .flat_map(|w| w.containers.iter().map(move |c| (w, c)))
            .collect();

        // Fan out by index so the cycle future stays `Send`.
        let classifications: Vec<Classification> = stream::iter(0..targets.len())
            .map(|i| {
                let (workload, container) = targets[i];
                self.inspect_and_classify(workload, container)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut aggregator = Aggregator::new();
        for workload in &workloads {
            aggregator.record_workload(workload);
        }
        for ((_, container), classification) in targets.iter().zip(&classifications) {
            aggregator.record_container(container, classification);
        }

        Some(aggregator.finish())
    }

    async fn inspect_and_classify(
        &self,
        workload: &WorkloadRecord,
        container: &ContainerSpec,
    ) -> Classification {
        let inspection = self.inspector.inspect(workload, container).await;
        self.classifier.classify(&inspection)
    }
}

impl CycleOutcome {
    pub const fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Published(_) => "published",
            CycleOutcome::Skipped => "skipped",
            CycleOutcome::TimedOut => "timed out",
        }
    }
}
