use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod join;
mod serve;

#[derive(Parser)]
#[command(name = "huddle", version, about = "Polled peer-to-peer call signaling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling server.
    Serve(serve::ServeArgs),
    /// Join a room as a headless participant.
    Join(join::JoinArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match Cli::parse().command {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Join(args) => join::run(args).await,
    }
}
