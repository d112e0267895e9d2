use clap::Parser;
use mcwatch::cli::{commands, Cli};
use std::process;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Starting mcwatch v{}", mcwatch::VERSION);

    let result = tokio::select! {
        result = commands::handle_command(cli.command) => result,
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    info!("mcwatch stopped");
}
