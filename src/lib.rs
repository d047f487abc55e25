pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod k8s;
pub mod metrics;

pub use config::Config;
pub use error::{PodscanError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
