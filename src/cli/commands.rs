use crate::cli::{Commands, ExporterArgs, StatusApiArgs};
use crate::k8s::{K8sClient, KubeLogSource, KubePodLocator};
use crate::metrics::{server, PrometheusExporter};
use crate::presence::{PresenceStore, PresenceTracker};
use crate::status::{self, PrometheusClient};
use crate::supervisor::Supervisor;
use crate::Result;
use std::sync::Arc;
use tracing::{error, info};

pub async fn handle_command(command: Option<Commands>) -> Result<()> {
    match command {
        Some(Commands::Exporter(args)) => handle_exporter(args).await,
        Some(Commands::StatusApi(args)) => handle_status_api(args).await,
        None => handle_exporter(ExporterArgs::default()).await,
    }
}

async fn handle_exporter(args: ExporterArgs) -> Result<()> {
    info!("Minecraft log exporter starting");

    let store = PresenceStore::new();
    let exporter = Arc::new(PrometheusExporter::new(store.clone(), args.port)?);
    let listener = server::bind(exporter.port()).await?;

    let client = K8sClient::try_default().await?;
    let tracker = PresenceTracker::new(store).with_metrics(exporter.metrics());
    let supervisor = Supervisor::new(
        KubePodLocator::new(client.clone()),
        KubeLogSource::new(client),
        args.target(),
        tracker,
    );

    tokio::spawn(async move {
        if let Err(e) = server::serve(listener, exporter).await {
            error!("Metrics server error: {}", e);
        }
    });

    supervisor.run().await;
    Ok(())
}

async fn handle_status_api(args: StatusApiArgs) -> Result<()> {
    info!("Status API starting, querying {}", args.prometheus_url);

    let prometheus = Arc::new(PrometheusClient::new(&args.prometheus_url));
    status::api::serve(prometheus, args.port).await
}
