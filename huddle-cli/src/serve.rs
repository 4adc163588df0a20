use anyhow::{Context, Result};
use colored::*;
use huddle::server::{Config, serve};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Every flag falls back to the `HUDDLE_*` variable the server itself reads.
#[derive(clap::Args, Debug, Default)]
pub struct ServeArgs {
    #[arg(long, env = "HUDDLE_BIND_ADDRESS")]
    pub bind: Option<String>,

    #[arg(long, env = "HUDDLE_LIVENESS_SECS")]
    pub liveness_secs: Option<u64>,

    #[arg(long, env = "HUDDLE_MAX_FETCH_LIMIT")]
    pub max_fetch_limit: Option<u32>,

    #[arg(long, env = "HUDDLE_MAX_PAYLOAD_BYTES")]
    pub max_payload_bytes: Option<usize>,

    #[arg(long, env = "HUDDLE_ROOM_IDLE_SECS")]
    pub room_idle_secs: Option<u64>,

    #[arg(long, env = "HUDDLE_PRUNE_INTERVAL_SECS")]
    pub prune_interval_secs: Option<u64>,

    /// Comma separated.
    #[arg(long, env = "HUDDLE_STUN_URLS")]
    pub stun_urls: Option<String>,

    #[arg(long, env = "HUDDLE_TURN_URL")]
    pub turn_url: Option<String>,

    #[arg(long, env = "HUDDLE_TURN_USERNAME")]
    pub turn_username: Option<String>,

    #[arg(long, env = "HUDDLE_TURN_CREDENTIAL", hide_env_values = true)]
    pub turn_credential: Option<String>,
}

impl ServeArgs {
    /// Runs the flags through the same parsing and validation as
    /// [`Config::from_env`].
    pub fn to_config(&self) -> Result<Config> {
        let pairs = [
            ("HUDDLE_BIND_ADDRESS", self.bind.clone()),
            ("HUDDLE_LIVENESS_SECS", self.liveness_secs.map(|v| v.to_string())),
            ("HUDDLE_MAX_FETCH_LIMIT", self.max_fetch_limit.map(|v| v.to_string())),
            ("HUDDLE_MAX_PAYLOAD_BYTES", self.max_payload_bytes.map(|v| v.to_string())),
            ("HUDDLE_ROOM_IDLE_SECS", self.room_idle_secs.map(|v| v.to_string())),
            ("HUDDLE_PRUNE_INTERVAL_SECS", self.prune_interval_secs.map(|v| v.to_string())),
            ("HUDDLE_STUN_URLS", self.stun_urls.clone()),
            ("HUDDLE_TURN_URL", self.turn_url.clone()),
            ("HUDDLE_TURN_USERNAME", self.turn_username.clone()),
            ("HUDDLE_TURN_CREDENTIAL", self.turn_credential.clone()),
        ];
        let vars: HashMap<String, String> = pairs
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
            .collect();
        Config::from_vars(&vars).context("Invalid server configuration")
    }
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let config = args.to_config()?;
    info!("Starting with {:?}", config);
    println!(
        "{} {}",
        "Huddle signaling server on".green().bold(),
        config.bind_address.cyan()
    );

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
        }
        ctrl_c.cancel();
    });

    serve(config, shutdown).await.context("Server failed")?;
    println!("{}", "Server stopped".yellow());
    Ok(())
}
