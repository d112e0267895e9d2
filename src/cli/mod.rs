pub mod commands;

use crate::k8s::types::{DEFAULT_CONTAINER, DEFAULT_LABEL_SELECTOR, DEFAULT_NAMESPACE};
use crate::k8s::Target;
use crate::metrics::METRICS_PORT;
use crate::status::{DEFAULT_PROMETHEUS_URL, STATUS_PORT};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mcwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Player presence exporter and status API for a Minecraft Bedrock server on Kubernetes", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Follow the server log and export player presence to Prometheus")]
    Exporter(ExporterArgs),
    #[command(about = "Serve the JSON status API backed by Prometheus")]
    StatusApi(StatusApiArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ExporterArgs {
    #[arg(short, long, default_value = DEFAULT_NAMESPACE, help = "Namespace of the server pod")]
    pub namespace: String,

    #[arg(short, long, default_value = DEFAULT_LABEL_SELECTOR, help = "Label selector of the server pod")]
    pub selector: String,

    #[arg(short, long, default_value = DEFAULT_CONTAINER, help = "Container whose logs are followed")]
    pub container: String,

    #[arg(short, long, default_value_t = METRICS_PORT, help = "Port of the metrics endpoint")]
    pub port: u16,
}

impl ExporterArgs {
    pub fn target(&self) -> Target {
        Target {
            namespace: self.namespace.clone(),
            label_selector: self.selector.clone(),
            container: self.container.clone(),
        }
    }
}

impl Default for ExporterArgs {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            selector: DEFAULT_LABEL_SELECTOR.to_string(),
            container: DEFAULT_CONTAINER.to_string(),
            port: METRICS_PORT,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StatusApiArgs {
    #[arg(long, default_value = DEFAULT_PROMETHEUS_URL, help = "Base URL of the Prometheus server")]
    pub prometheus_url: String,

    #[arg(short, long, default_value_t = STATUS_PORT, help = "Port of the status API")]
    pub port: u16,
}
