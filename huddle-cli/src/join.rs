use anyhow::{Context, Result};
use colored::*;
use dialoguer::Input;
use huddle::client::{CallSession, HttpTransport, TrackRegistry, WebRtcConnector};
use huddle::engine::{LocalMedia, TrackKind};
use huddle::model::RoomId;
use huddle::utils::default_ice_servers;
use huddle::{PeerEvent, RemovalReason};
use std::io::IsTerminal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(clap::Args, Debug)]
pub struct JoinArgs {
    /// Signaling server base url.
    #[arg(long, env = "HUDDLE_SERVER", default_value = "http://localhost:3000")]
    pub server: String,

    #[arg(long)]
    pub room: String,

    /// Display name. Prompted for when omitted on a terminal; otherwise the
    /// server picks a guest name.
    #[arg(long)]
    pub name: Option<String>,

    /// Send a (silent) microphone track.
    #[arg(long)]
    pub audio: bool,

    /// Offer a camera track. No frames are produced.
    #[arg(long)]
    pub video: bool,
}

fn display_name(args: &JoinArgs) -> Result<Option<String>> {
    if args.name.is_some() || !std::io::stdin().is_terminal() {
        return Ok(args.name.clone());
    }
    let name: String = Input::new()
        .with_prompt("Display name (empty for guest)")
        .allow_empty(true)
        .interact_text()?;
    let name = name.trim();
    Ok((!name.is_empty()).then(|| name.to_string()))
}

fn describe(event: &PeerEvent) -> String {
    match event {
        PeerEvent::Added(id) => format!("{} {}", "+ connecting".cyan(), id),
        PeerEvent::Connected(id) => format!("{} {}", "= connected".green().bold(), id),
        PeerEvent::Removed(id, reason) => {
            let why = match reason {
                RemovalReason::Left => "left".to_string(),
                RemovalReason::ConnectionLost(state) => format!("connection {:?}", state),
                RemovalReason::Absent => "no longer present".to_string(),
                RemovalReason::LocalShutdown => "call closed".to_string(),
            };
            format!("{} {} ({})", "- removed".yellow(), id, why)
        }
    }
}

pub async fn run(args: JoinArgs) -> Result<()> {
    let room = RoomId::parse(args.room.clone())?;
    let name = display_name(&args)?;
    let transport = Arc::new(HttpTransport::new(&args.server)?);

    let ice_servers = match transport.ice_servers().await {
        Ok(servers) if !servers.is_empty() => servers,
        Ok(_) => default_ice_servers(),
        Err(e) => {
            warn!("Could not fetch ICE servers, using defaults: {}", e);
            default_ice_servers()
        }
    };

    let tracks = Arc::new(TrackRegistry::new());
    let pumps = CancellationToken::new();
    let mut media = LocalMedia::none();
    let mut pump_tasks = Vec::new();
    if args.audio {
        let mic = tracks.create(TrackKind::Audio, "mic");
        pump_tasks.extend(tracks.spawn_silence(&mic, pumps.child_token()));
        media.audio = Some(mic);
    }
    if args.video {
        media.camera = Some(tracks.create(TrackKind::Video, "camera"));
    }

    let connector = WebRtcConnector::new(&ice_servers, tracks)?;
    let mut session = CallSession::join(transport, connector, room, name.as_deref(), media)
        .await
        .context("Failed to join")?;

    println!(
        "{} {} as {} ({} already here)",
        "Joined".green().bold(),
        session.room().as_str().cyan(),
        session.identity().display_name.bold(),
        session.others_at_join().len()
    );
    println!("{}", "Press Ctrl-C to leave".dimmed());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = session.next_event() => match event {
                Some(event) => println!("{}", describe(&event)),
                None => break,
            },
        }
    }

    pumps.cancel();
    for task in pump_tasks {
        let _ = task.await;
    }
    session.leave().await?;
    println!("{}", "Left the room".yellow());
    Ok(())
}
