use crate::cli::{Commands, OutputFormat, Overrides};
use crate::config::Config;
use crate::discovery::{AggregateSnapshot, CycleOutcome, Poller};
use crate::k8s::K8sClient;
use crate::metrics::{self, MemorySink, PrometheusExporter, PrometheusSink};
use crate::{PodscanError, Result};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub async fn handle_command(command: Option<Commands>, config_path: Option<&Path>) -> Result<()> {
    let mut config = Config::load(config_path)?;

    match command.unwrap_or(Commands::Run {
        overrides: Overrides::default(),
        port: None,
        interval: None,
    }) {
        Commands::Run {
            overrides,
            port,
            interval,
        } => {
            apply_overrides(&mut config, &overrides);
            if let Some(port) = port {
                config.listen_port = port;
            }
            if let Some(interval) = interval {
                config.poll_interval_secs = interval;
            }
            config.validate()?;
            handle_run(config).await
        }
        Commands::Scan { overrides, format } => {
            apply_overrides(&mut config, &overrides);
            config.validate()?;
            handle_scan(config, format).await
        }
    }
}

fn apply_overrides(config: &mut Config, overrides: &Overrides) {
    if let Some(concurrency) = overrides.concurrency {
        config.max_concurrent_inspections = concurrency;
    }
    if let Some(exec_timeout) = overrides.exec_timeout {
        config.exec_timeout_secs = exec_timeout;
    }
}

async fn handle_run(config: Config) -> Result<()> {
    let client = Arc::new(K8sClient::try_default().await?);

    let registry = metrics::new_registry()?;
    let sink = Arc::new(PrometheusSink::new(&registry)?);
    let poller = Poller::new(client, sink, &config)?;
    let exporter = PrometheusExporter::new(registry, config.listen_port);
    let server = exporter.start().await?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        cancel_on_signal(tokio::signal::ctrl_c().await, &signal_token);
    });

    let result = supervise(poller.run(shutdown.clone()), server).await;
    shutdown.cancel();
    result
}

/// Cancel `token` once a shutdown signal arrives. If the signal handler
/// could not be installed the process keeps running.
fn cancel_on_signal(signal: std::io::Result<()>, token: &CancellationToken) {
    match signal {
        Ok(()) => {
            info!("Shutdown signal received");
            token.cancel();
        }
        Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
    }
}

/// Drive discovery until it stops or the metrics server exits. The server
/// exiting on its own is always an error.
async fn supervise<F>(discovery: F, mut server: JoinHandle<Result<()>>) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = discovery => {
            server.abort();
            Ok(())
        }
        joined = &mut server => match joined {
            Ok(Ok(())) => Err(PodscanError::MetricsError(
                "Metrics server stopped unexpectedly".to_string(),
            )),
            Ok(Err(e)) => Err(e),
            Err(e) => Err(PodscanError::MetricsError(format!(
                "Metrics server task failed: {}",
                e
            ))),
        },
    }
}

async fn handle_scan(config: Config, format: OutputFormat) -> Result<()> {
    let client = Arc::new(K8sClient::try_default().await?);
    let sink = Arc::new(MemorySink::new());
    let poller = Poller::new(client, sink, &config)?;

    let snapshot = scan_result(poller.run_cycle().await)?;
    println!("{}", render(&snapshot, format)?);
    Ok(())
}

fn scan_result(outcome: CycleOutcome) -> Result<AggregateSnapshot> {
    match outcome {
        CycleOutcome::Published(snapshot) => Ok(snapshot),
        outcome => Err(PodscanError::CycleIncomplete(outcome.label().to_string())),
    }
}

pub fn render(snapshot: &AggregateSnapshot, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(snapshot)
            .map_err(|e| PodscanError::SerializationError(e.to_string())),
        OutputFormat::Yaml => serde_yaml::to_string(snapshot)
            .map_err(|e| PodscanError::SerializationError(e.to_string())),
    }
}
