use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use meshcall_client::{
    LocalMediaSource, PlaceholderMediaSource, RtcConnectionFactory, Session,
    SessionConfig, SessionEvent, TransportConfig, UnavailableCapture, WsTransport,
};
use meshcall_core::RoomHandle;
use meshcall_core::utils::DEFAULT_STUN_ADDR;
use meshcall_server::RelayConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meshcall", version, about = "Full-mesh WebRTC calls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(long, default_value = "0.0.0.0:3000")]
        bind: SocketAddr,
    },
    /// Join a room as a headless participant. Lines typed on stdin are sent as chat.
    Join {
        #[arg(long, default_value = "ws://127.0.0.1:3000/ws")]
        server: String,

        #[arg(long)]
        room: String,

        #[arg(long, default_value = "guest")]
        name: String,

        #[arg(long = "stun", default_value = DEFAULT_STUN_ADDR)]
        stun: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve { bind } => {
            println!("{}", "Starting meshcall relay...".green().bold());
            meshcall_server::serve(RelayConfig { bind }).await
        }
        Commands::Join {
            server,
            room,
            name,
            stun,
        } => join(server, room, name, stun).await,
    }
}

async fn join(server: String, room: String, name: String, stun: Vec<String>) -> Result<()> {
    let room = RoomHandle::new(&room).context("Invalid room handle")?;

    let (transport, frames) = WsTransport::connect(&server).await?;
    let placeholder = PlaceholderMediaSource::new();
    let media =
        LocalMediaSource::resolve(&UnavailableCapture, &UnavailableCapture, &placeholder).await;
    let factory = RtcConnectionFactory::new(TransportConfig::with_stun(stun));

    let (session, handle, mut events) = Session::new(
        SessionConfig { display_name: name },
        Arc::new(transport),
        frames,
        Arc::new(factory),
        media,
    );
    let session_task = tokio::spawn(session.run());

    handle.join(room.clone()).await?;
    println!("{} {}", "Joining".cyan(), room.as_str().bold());

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let ended = matches!(event, SessionEvent::Ended);
                print_event(event);
                if ended {
                    break;
                }
            }

            line = stdin.next_line(), if stdin_open => {
                match line {
                    Ok(Some(text)) if !text.trim().is_empty() => {
                        if handle.send_chat(text).await.is_err() {
                            break;
                        }
                    }
                    Ok(Some(_)) => {}
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        stdin_open = false;
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, leaving");
                let _ = handle.leave().await;
            }
        }
    }

    session_task.await.context("Session task panicked")?;
    Ok(())
}

fn print_event(event: SessionEvent) {
    match event {
        SessionEvent::Connected(id) => println!("{} as {}", "Connected".green(), id),
        SessionEvent::RoomJoined(room) => println!("{} {}", "In room".green(), room),
        SessionEvent::ParticipantJoined(id) => println!("{} {}", "+".green().bold(), id),
        SessionEvent::ParticipantLeft(id) => println!("{} {}", "-".red().bold(), id),
        SessionEvent::RemoteStream { id, stream } => println!(
            "{} from {} ({} track(s))",
            "Media".cyan(),
            id,
            stream.tracks().len()
        ),
        SessionEvent::PairingFailed { id, reason } => {
            println!("{} with {}: {}", "Pairing failed".red(), id, reason)
        }
        SessionEvent::Chat(chat) => println!("{} {}", format!("[{}]", chat.sender).yellow(), chat.text),
        SessionEvent::Ended => println!("{}", "Call ended".bold()),
    }
}
