//! Discoverable blackjack server.
//!
//! Announces itself over UDP broadcast and plays blackjack with every admitted
//! TCP client until Ctrl+C.

mod config;
mod logging;

use anyhow::{Context, Error, bail};
use blackjack::server::Server;
use pico_args::Arguments;
use tokio::{signal, sync::watch};
use tracing::info;

use config::{CliOverrides, ServerConfig};

const HELP: &str = "\
Run a discoverable blackjack server

USAGE:
  bj_server [OPTIONS]

OPTIONS:
  --name          NAME      Server name announced in offers  [default: env BJ_SERVER_NAME or CyberCasino_7]
  --bind          IP:PORT   Server socket bind address       [default: env BJ_BIND or 0.0.0.0:0]
  --max-sessions  N         Concurrent sessions, 1 to 20     [default: env BJ_MAX_SESSIONS or 5]

FLAGS:
  --no-discovery            Do not broadcast offers
  -h, --help                Print help information

ENVIRONMENT:
  BJ_SERVER_NAME            Server name announced in offers
  BJ_BIND                   Server bind address (e.g., 0.0.0.0:0)
  BJ_MAX_SESSIONS           Concurrent session limit
  BJ_READ_TIMEOUT_SECS      Client read timeout in seconds, 0 disables [default: 3000]
  BJ_BROADCAST_ADDR         Offer destination [default: 255.255.255.255:13122]
  BJ_BROADCAST_INTERVAL_MS  Offer period in milliseconds [default: 1000]
  BJ_DISCOVERY              Broadcast offers (true/false) [default: true]
  RUST_LOG                  Log filter [default: info]
  (A .env file in the working directory is read first)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let overrides = CliOverrides {
        name: pargs.opt_value_from_str("--name")?,
        bind: pargs.opt_value_from_str("--bind")?,
        max_sessions: pargs.opt_value_from_str("--max-sessions")?,
        no_discovery: pargs.contains("--no-discovery"),
    };
    let remaining = pargs.finish();
    if !remaining.is_empty() {
        bail!("unexpected arguments: {remaining:?}");
    }

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;
    info!(
        "Starting blackjack server {:?} at {}",
        config.server_name, config.bind
    );

    let bind = config.bind;
    let server = Server::bind(config.into_settings())
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(server.run(shutdown_rx));

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        signal = signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl+C")?;
            info!("Received Ctrl+C, shutting down");
        }
    }

    shutdown_tx.send_replace(true);
    server.await??;
    Ok(())
}
