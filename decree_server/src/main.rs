//! TheDecree server: a WebSocket-only card-game server using an
//! actor-per-room concurrency model.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use ctrlc::set_handler;
use decree_engine::{Hub, autoplay::Conservative};
use pico_args::Arguments;
use tracing::info;

use decree_server::api;
use decree_server::config::ServerConfig;
use decree_server::logging;

const HELP: &str = "\
Run TheDecree game server

USAGE:
  decree_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                   Server bind address (e.g., 0.0.0.0:8080)
  ROOM_MAX_PLAYERS              Maximum players per room
  MAX_ROOMS                     Maximum concurrently open rooms
  ROOM_IDLE_TIMEOUT_MINUTES     Minutes of inactivity before a room is swept
  ROOM_SWEEP_INTERVAL_SECS      How often the idle-room sweep runs
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.value_from_str("--bind").ok();

    set_handler(|| std::process::exit(0))?;

    logging::init();

    let config = ServerConfig::from_env(bind_override)?;
    info!("starting TheDecree server at {}", config.bind);

    let strategy = Arc::new(Conservative);
    let hub = Arc::new(Hub::new(strategy));

    let sweep_hub = Arc::clone(&hub);
    let sweep_interval = config.sweep_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            sweep_hub.sweep_idle_rooms().await;
        }
    });

    let api_state = api::AppState { hub };
    let app = api::create_router(api_state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind to {}: {}", config.bind, e))?;

    info!(
        "server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("server error: {}", e))?;

    info!("shutting down server");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
}
