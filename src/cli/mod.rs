pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "podscan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Report base image and FIPS posture of Kubernetes workloads as Prometheus metrics", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to a YAML configuration file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Poll the cluster and serve metrics (default)")]
    Run {
        #[command(flatten)]
        overrides: Overrides,

        #[arg(short, long, help = "Metrics listen port")]
        port: Option<u16>,

        #[arg(short, long, help = "Poll interval in seconds")]
        interval: Option<u64>,
    },
    #[command(about = "Run a single discovery cycle and print the results")]
    Scan {
        #[command(flatten)]
        overrides: Overrides,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json, help = "Output format")]
        format: OutputFormat,
    },
}

#[derive(clap::Args, Default)]
pub struct Overrides {
    #[arg(long, help = "Maximum number of concurrent container inspections")]
    pub concurrency: Option<usize>,

    #[arg(long, help = "Per-container exec timeout in seconds")]
    pub exec_timeout: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}
